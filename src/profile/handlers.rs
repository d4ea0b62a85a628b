use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::services::{self, ImageError, ProfileError};
use crate::{
    auth::AuthUser,
    model::{ProfilePatch, User},
    state::AppState,
};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024; // 10MB

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/update-profile", put(update_profile))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// PUT /auth/update-profile { "profilePic": "data:image/...;base64,..." | null }
#[instrument(skip(state, patch))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<User>, (StatusCode, String)> {
    services::update_profile_pic(&state, user_id, patch.profile_pic.as_deref())
        .await
        .map(Json)
        .map_err(|e| into_response_error(e, user_id))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<User>, (StatusCode, String)> {
    services::current_user(&state, user_id)
        .await
        .map(Json)
        .map_err(|e| into_response_error(e, user_id))
}

fn into_response_error(e: ProfileError, user_id: uuid::Uuid) -> (StatusCode, String) {
    match e {
        ProfileError::Image(img) => {
            warn!(%user_id, error = %img, "rejected profile picture");
            let status = match img {
                ImageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, img.to_string())
        }
        ProfileError::UserNotFound => {
            warn!(%user_id, "user not found");
            (StatusCode::NOT_FOUND, "User not found".into())
        }
        ProfileError::Internal(e) => {
            error!(%user_id, error = %format!("{e:#}"), "profile update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{header, Method, Request},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{auth::JwtKeys, state::FakeStorage};

    fn app(storage: Arc<FakeStorage>) -> (Router, String) {
        let state = AppState::fake_with_storage(storage);
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4())
            .unwrap();
        (profile_routes().with_state(state), token)
    }

    fn put_json(token: Option<&str>, body: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method(Method::PUT)
            .uri("/auth/update-profile")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn update_requires_bearer_token() {
        let (app, _) = app(Arc::default());
        let res = app
            .oneshot(put_json(None, r#"{"profilePic":null}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_rejects_garbage_tokens() {
        let (app, _) = app(Arc::default());
        let res = app
            .oneshot(put_json(Some("not-a-jwt"), r#"{"profilePic":null}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(res).await, "Invalid or expired token");
    }

    #[tokio::test]
    async fn update_requires_profile_pic_field() {
        let (app, token) = app(Arc::default());
        let res = app.oneshot(put_json(Some(&token), "{}")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn non_image_payload_is_rejected_without_storing() {
        let storage = Arc::new(FakeStorage::default());
        let (app, token) = app(storage.clone());
        let res = app
            .oneshot(put_json(
                Some(&token),
                r#"{"profilePic":"data:text/plain;base64,aGVsbG8="}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(res).await, "unsupported image type text/plain");
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_image_is_rejected() {
        let storage = Arc::new(FakeStorage::default());
        let (app, token) = app(storage.clone());
        // fake state caps avatars at 1024 bytes
        let payload = "A".repeat(4096);
        let body = format!(r#"{{"profilePic":"data:image/png;base64,{}"}}"#, payload);
        let res = app.oneshot(put_json(Some(&token), &body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let (app, _) = app(Arc::default());
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn database_failure_is_500_and_leaves_no_object() {
        let storage = Arc::new(FakeStorage::default());
        let (app, token) = app(storage.clone());
        let body = format!(
            r#"{{"profilePic":"data:image/png;base64,{}"}}"#,
            "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg=="
        );
        let res = app.oneshot(put_json(Some(&token), &body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(storage.objects.lock().unwrap().is_empty());
        assert_eq!(storage.deleted.lock().unwrap().len(), 1);
    }
}
