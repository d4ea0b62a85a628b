use base64ct::{Base64, Encoding};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::repo_types::UserRow;
use crate::{model::User, state::AppState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("profilePic must be a base64 image data URL")]
    NotDataUrl,
    #[error("unsupported image type {0}")]
    UnsupportedType(String),
    #[error("profilePic is not valid base64")]
    InvalidBase64,
    #[error("image is empty")]
    Empty,
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Image bytes pulled out of a data URL.
#[derive(Debug)]
pub struct DecodedImage {
    pub content_type: String,
    pub body: Bytes,
}

pub(crate) fn parse_data_url(value: &str, limit: usize) -> Result<DecodedImage, ImageError> {
    lazy_static! {
        static ref DATA_URL_RE: Regex =
            Regex::new(r"^data:([A-Za-z]+/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/=\s]*)$").unwrap();
    }
    let caps = DATA_URL_RE
        .captures(value.trim())
        .ok_or(ImageError::NotDataUrl)?;
    let content_type = caps[1].to_ascii_lowercase();
    if ext_from_mime(&content_type).is_none() {
        return Err(ImageError::UnsupportedType(content_type));
    }

    let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    if payload.is_empty() {
        return Err(ImageError::Empty);
    }
    // Reject oversized payloads before allocating the decoded buffer.
    let approx = payload.len() / 4 * 3;
    if approx > limit + 2 {
        return Err(ImageError::TooLarge { size: approx, limit });
    }
    let body = Base64::decode_vec(&payload).map_err(|_| ImageError::InvalidBase64)?;
    if body.is_empty() {
        return Err(ImageError::Empty);
    }
    if body.len() > limit {
        return Err(ImageError::TooLarge {
            size: body.len(),
            limit,
        });
    }

    Ok(DecodedImage {
        content_type,
        body: Bytes::from(body),
    })
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/avif" => Some("avif"),
        "image/bmp" => Some("bmp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

pub(crate) fn avatar_key(user_id: Uuid, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("avatars/{}/{}.{}", user_id, Uuid::new_v4(), ext)
}

/// Object keys are ours to presign and delete; URLs were stored verbatim.
fn is_object_key(reference: &str) -> bool {
    !(reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("data:"))
}

/// Turns a stored reference into something a browser can load.
pub async fn resolve_locator(st: &AppState, reference: &str) -> anyhow::Result<String> {
    if !is_object_key(reference) {
        return Ok(reference.to_string());
    }
    st.storage
        .presign_get(reference, st.config.storage.url_ttl_secs)
        .await
}

pub async fn to_public_user(st: &AppState, row: UserRow) -> anyhow::Result<User> {
    let profile_pic = match row.profile_pic.as_deref() {
        Some(r) => Some(resolve_locator(st, r).await?),
        None => None,
    };
    Ok(User {
        id: row.id,
        full_name: row.full_name,
        email: row.email,
        profile_pic,
        created_at: row.created_at,
    })
}

pub async fn current_user(st: &AppState, user_id: Uuid) -> Result<User, ProfileError> {
    let row = UserRow::find_by_id(&st.db, user_id)
        .await?
        .ok_or(ProfileError::UserNotFound)?;
    Ok(to_public_user(st, row).await?)
}

/// Replaces (`Some`) or removes (`None`) the user's picture and returns the
/// authoritative record.
pub async fn update_profile_pic(
    st: &AppState,
    user_id: Uuid,
    profile_pic: Option<&str>,
) -> Result<User, ProfileError> {
    let new_key = match profile_pic {
        Some(data_url) => {
            let image = parse_data_url(data_url, st.config.max_avatar_bytes)?;
            let key = avatar_key(user_id, &image.content_type);
            let size = image.body.len();
            st.storage
                .put_object(&key, image.body, &image.content_type)
                .await?;
            debug!(%user_id, %key, size, "avatar stored");
            Some(key)
        }
        None => None,
    };

    let updated = match UserRow::set_profile_pic(&st.db, user_id, new_key.as_deref()).await {
        Ok(v) => v,
        Err(e) => {
            discard_object(st, new_key.as_deref()).await;
            return Err(e.into());
        }
    };
    let Some((row, previous)) = updated else {
        discard_object(st, new_key.as_deref()).await;
        return Err(ProfileError::UserNotFound);
    };

    if previous.as_deref() != new_key.as_deref() {
        discard_object(st, previous.as_deref()).await;
    }

    info!(%user_id, removed = new_key.is_none(), "profile picture updated");
    Ok(to_public_user(st, row).await?)
}

// Best-effort cleanup: a leaked object is not worth failing the request for.
async fn discard_object(st: &AppState, reference: Option<&str>) {
    let Some(key) = reference.filter(|r| is_object_key(r)) else {
        return;
    };
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, %key, "failed to delete avatar object");
    }
}
