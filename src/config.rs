use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not defined")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Connection settings. `url` stays optional here; a missing value is
/// reported by the bootstrap in `db::connect`.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub url_ttl_secs: u64,
}

/// Listen address for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "APP_HOST",
                value: self.host.clone(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub max_avatar_bytes: usize,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            url: lookup("DATABASE_URL"),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            connect_timeout: Duration::from_secs(parse_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", 10)?),
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
        };
        let database = DatabaseConfig::from_lookup(&lookup)?;
        let jwt = JwtConfig {
            secret: required(&lookup, "JWT_SECRET")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "chatprofile".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "chatprofile-users".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60)?,
        };
        let storage = StorageConfig {
            endpoint: required(&lookup, "MINIO_ENDPOINT")?,
            bucket: required(&lookup, "MINIO_BUCKET")?,
            access_key: required(&lookup, "MINIO_ACCESS_KEY")?,
            secret_key: required(&lookup, "MINIO_SECRET_KEY")?,
            region: lookup("MINIO_REGION").unwrap_or_else(|| "us-east-1".into()),
            url_ttl_secs: parse_or(&lookup, "AVATAR_URL_TTL_SECS", 30 * 60)?,
        };
        Ok(Self {
            server,
            database,
            jwt,
            storage,
            max_avatar_bytes: parse_or(&lookup, "MAX_AVATAR_BYTES", 5 * 1024 * 1024)?,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}
