//! API server configuration.

use aluforce_core::config::{AuthSettings, ConfigError};
use aluforce_core::db::DbSettings;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:3000").
    pub bind_addr: String,
    /// Token, login and access-policy settings.
    pub auth: AuthSettings,
    /// MySQL connection parameters.
    pub db: DbSettings,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable         | Default                                      |
    /// |------------------|----------------------------------------------|
    /// | `BIND_ADDR`      | `0.0.0.0:3000`                               |
    /// | `COOKIE_SECURE`  | `true` when `APP_ENV=production`             |
    /// | `JWT_*`, `*_ROLES`, `LOGIN_*` | see [`AuthSettings::from_env`]  |
    /// | `DB_*`           | see [`DbSettings::from_env`]                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth = AuthSettings::from_lookup(&lookup)?;
        let db = DbSettings::from_lookup(&lookup)?;
        let secure_cookies = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool("COOKIE_SECURE", &raw)?,
            None => auth.production,
        };
        Ok(Self {
            bind_addr: lookup("BIND_ADDR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            auth,
            db,
            secure_cookies,
        })
    }

    /// Config for tests and embedding: defaults plus the given secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            auth: AuthSettings::with_secret(secret),
            db: DbSettings::default(),
            secure_cookies: false,
        }
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
