//! Process configuration read once at startup.

use std::fmt::Display;
use std::str::FromStr;

use mimaropa_core::attachment::DEFAULT_MAX_UPLOAD_BYTES;

use crate::auth::jwt::JwtConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API (the portal frontend).
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long the notification writer gets to drain after the server stops.
    pub shutdown_timeout_secs: u64,
    /// Flat directory holding uploaded reports and funding documents.
    pub uploads_dir: String,
    /// Largest accepted uploaded file, in bytes.
    pub max_upload_bytes: usize,
    pub jwt: JwtConfig,
}

/// Parse `key` from the environment, falling back to `default` when unset.
///
/// # Panics
///
/// Panics when the variable is set but does not parse.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load from the environment. Malformed values abort startup.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `60`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `10`                    |
    /// | `UPLOADS_DIR`           | `uploads`               |
    /// | `MAX_UPLOAD_BYTES`      | `20971520` (20 MiB)     |
    ///
    /// JWT settings come from [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let max_upload_bytes = env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);
        assert!(max_upload_bytes > 0, "MAX_UPLOAD_BYTES must be positive");

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 60),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 10),
            uploads_dir: env_or("UPLOADS_DIR", "uploads".to_string()),
            max_upload_bytes,
            jwt: JwtConfig::from_env(),
        }
    }
}
