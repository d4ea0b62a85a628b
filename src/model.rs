use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Public user record exchanged between server and client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_pic: Option<String>, // resolved locator or inline data URL
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Body of the profile update call.
///
/// `profilePic` must be present: a data URL replaces the picture, an
/// explicit `null` removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfilePatch {
    #[serde(deserialize_with = "required_nullable")]
    pub profile_pic: Option<String>,
}

impl ProfilePatch {
    pub fn replace(encoded: impl Into<String>) -> Self {
        Self {
            profile_pic: Some(encoded.into()),
        }
    }

    pub fn remove() -> Self {
        Self { profile_pic: None }
    }

    pub fn is_removal(&self) -> bool {
        self.profile_pic.is_none()
    }
}

// A custom deserializer turns off serde's "missing Option means None" rule.
fn required_nullable<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de)
}
