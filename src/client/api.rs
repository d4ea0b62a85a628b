use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{ProfilePatch, User};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
}

/// Server operations the profile page depends on.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn update_profile(&self, patch: &ProfilePatch) -> Result<User, ApiError>;
    async fn current_user(&self) -> Result<User, ApiError>;
}

/// `ProfileApi` over HTTP, authenticated with the session's bearer token.
#[derive(Clone)]
pub struct HttpProfileApi {
    http: Client,
    base_url: String,
    token: String,
}

impl HttpProfileApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send_for_user(&self, req: RequestBuilder) -> Result<User, ApiError> {
        let res = req.bearer_auth(&self.token).send().await?;
        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %message, "profile api error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(res.json::<User>().await?)
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn update_profile(&self, patch: &ProfilePatch) -> Result<User, ApiError> {
        debug!(removal = patch.is_removal(), "PUT update-profile");
        self.send_for_user(self.http.put(self.url("/auth/update-profile")).json(patch))
            .await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.send_for_user(self.http.get(self.url("/auth/me"))).await
    }
}
