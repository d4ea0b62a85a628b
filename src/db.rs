use std::str::FromStr;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("DATABASE_URL environment variable is not defined")]
    Unconfigured,
    #[error("DATABASE_URL is not a valid connection string: {0}")]
    InvalidUrl(String),
    #[error("database connection failed")]
    Connect(#[source] sqlx::Error),
}

/// Live database handle. Built once at startup by [`connect`] and shared
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct Connection {
    pool: PgPool,
    endpoint: String,
}

impl Connection {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `host:port` the pool is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn into_pool(self) -> PgPool {
        self.pool
    }
}

/// Establishes the datastore connection. Any failure is fatal for the
/// caller; nothing here retries.
pub async fn connect(cfg: &DatabaseConfig) -> Result<Connection, BootstrapError> {
    let url = cfg
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(BootstrapError::Unconfigured)?;

    let endpoint = endpoint_of(url)?;
    let options =
        PgConnectOptions::from_str(url).map_err(|e| BootstrapError::InvalidUrl(e.to_string()))?;

    debug!(%endpoint, "connecting to database");
    // connect_with opens the first connection eagerly, so a dead server fails here.
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(cfg.connect_timeout)
        .connect_with(options)
        .await
        .map_err(BootstrapError::Connect)?;

    info!(host = %endpoint, "database connected");
    Ok(Connection { pool, endpoint })
}

fn endpoint_of(url: &str) -> Result<String, BootstrapError> {
    let parsed = Url::parse(url).map_err(|e| BootstrapError::InvalidUrl(e.to_string()))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost");
    let port = parsed.port().unwrap_or(5432);
    Ok(format!("{}:{}", host, port))
}
