use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,                    // unique user ID
    pub full_name: String,           // display name
    pub email: String,               // user email
    pub profile_pic: Option<String>, // object key, or a URL stored as-is
    pub created_at: OffsetDateTime,  // creation timestamp
}
