//! Authentication settings: token parameters, login rules and the access
//! policy table, read once at startup.

use std::fmt;

use thiserror::Error;

use crate::auth::permissions::AccessPolicy;
use crate::models::auth::Module;

/// Default token audience.
pub const DEFAULT_AUDIENCE: &str = "aluforce";

/// Session token lifetime: 8 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 8 * 60 * 60;

/// Longest accepted session token lifetime: 30 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Minimum secret length accepted when `APP_ENV=production`.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Secrets known to have circulated in source or documentation.
const COMPROMISED_SECRETS: &[&str] = &[
    "secret",
    "jwt-secret",
    "your-secret-key",
    "changeme",
    "dev-only-secret-change-in-production-2026",
];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set")]
    MissingSecret,

    #[error("JWT_SECRET rejected in production: {0}")]
    WeakSecret(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Signing parameters for session tokens.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub audience: String,
    pub ttl_secs: i64,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Email handling applied before the credential lookup.
#[derive(Debug, Clone, Default)]
pub struct LoginSettings {
    /// Domain appended to bare logins such as `joao.silva`.
    pub default_domain: Option<String>,
    /// When non-empty, only these domains may log in.
    pub allowed_domains: Vec<String>,
}

impl LoginSettings {
    /// Normalise a login identifier into the email used for lookup.
    ///
    /// Returns `None` when the domain is not allowed.
    pub fn normalize_email(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let email = match (&self.default_domain, trimmed.contains('@')) {
            (Some(domain), false) => format!("{trimmed}@{domain}"),
            _ => trimmed.to_string(),
        };
        if self.allowed_domains.is_empty() {
            return Some(email);
        }
        let domain = email.rsplit_once('@').map(|(_, d)| d.to_lowercase())?;
        self.allowed_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&domain))
            .then_some(email)
    }
}

/// All authentication settings, constructed once and shared by reference.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub token: TokenSettings,
    pub login: LoginSettings,
    pub policy: AccessPolicy,
    /// `APP_ENV=production`: stricter secret rules, secure cookies.
    pub production: bool,
}

impl AuthSettings {
    /// Settings with defaults for everything except the secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            token: TokenSettings {
                secret: secret.into(),
                audience: DEFAULT_AUDIENCE.to_string(),
                ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            },
            login: LoginSettings::default(),
            policy: AccessPolicy::default(),
            production: false,
        }
    }

    /// Reads settings from process environment variables.
    ///
    /// | Variable                | Default                                         |
    /// |-------------------------|-------------------------------------------------|
    /// | `JWT_SECRET`            | required                                        |
    /// | `JWT_AUDIENCE`          | `aluforce`                                      |
    /// | `JWT_TTL_SECS`          | `28800` (8 h)                                   |
    /// | `ADMIN_ROLES`           | `admin,administrador,ti,diretoria,financeiro,rh`|
    /// | `MANAGER_ROLES`         | `admin,administrador,ti`                        |
    /// | `ROLE_MODULES`          | empty (`comercial=vendas,faturamento;pcp=pcp`)  |
    /// | `LOGIN_DEFAULT_DOMAIN`  | unset                                           |
    /// | `LOGIN_ALLOWED_DOMAINS` | unset (any domain)                              |
    /// | `APP_ENV`               | unset                                           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthSettings::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let production =
            get("APP_ENV").is_some_and(|v| v.trim().eq_ignore_ascii_case("production"));

        let secret = get("JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        if production {
            check_production_secret(&secret)?;
        }

        let ttl_secs = match get("JWT_TTL_SECS") {
            Some(raw) => parse_ttl(&raw)?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let policy = policy_from_lookup(&lookup)?;

        Ok(Self {
            token: TokenSettings {
                secret,
                audience: get("JWT_AUDIENCE")
                    .map(|a| a.trim().to_string())
                    .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
                ttl_secs,
            },
            login: LoginSettings {
                default_domain: get("LOGIN_DEFAULT_DOMAIN")
                    .map(|d| d.trim().trim_start_matches('@').to_string()),
                allowed_domains: get("LOGIN_ALLOWED_DOMAINS")
                    .map(|raw| {
                        split_list(&raw)
                            .into_iter()
                            .map(|d| d.trim_start_matches('@').to_string())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            policy,
            production,
        })
    }
}

/// Build the access policy from `ADMIN_ROLES`, `MANAGER_ROLES` and
/// `ROLE_MODULES`. Needs no secret, so offline tooling can use it.
pub fn policy_from_env() -> Result<AccessPolicy, ConfigError> {
    policy_from_lookup(|key| std::env::var(key).ok())
}

pub fn policy_from_lookup<F>(lookup: F) -> Result<AccessPolicy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let mut policy = AccessPolicy::default();
    if let Some(raw) = get("ADMIN_ROLES") {
        policy = policy.with_admin_roles(split_list(&raw));
    }
    if let Some(raw) = get("MANAGER_ROLES") {
        policy = policy.with_manager_roles(split_list(&raw));
    }
    if let Some(raw) = get("ROLE_MODULES") {
        for (role, modules) in parse_role_modules(&raw)? {
            policy = policy.with_role_modules(&role, modules);
        }
    }
    Ok(policy)
}

fn check_production_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_PRODUCTION_SECRET_LEN {
        return Err(ConfigError::WeakSecret(format!(
            "must be at least {MIN_PRODUCTION_SECRET_LEN} characters"
        )));
    }
    if COMPROMISED_SECRETS.contains(&secret) {
        return Err(ConfigError::WeakSecret("value is known to be compromised".into()));
    }
    Ok(())
}

fn parse_ttl(raw: &str) -> Result<i64, ConfigError> {
    let ttl = raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
        key: "JWT_TTL_SECS",
        message: e.to_string(),
    })?;
    if ttl <= 0 {
        return Err(ConfigError::Invalid {
            key: "JWT_TTL_SECS",
            message: "must be positive".into(),
        });
    }
    if ttl > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::Invalid {
            key: "JWT_TTL_SECS",
            message: format!("must not exceed {MAX_TOKEN_TTL_SECS} (30 days)"),
        });
    }
    Ok(ttl)
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `role=mod1,mod2;role2=mod3`.
fn parse_role_modules(raw: &str) -> Result<Vec<(String, Vec<Module>)>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (role, modules) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
                key: "ROLE_MODULES",
                message: format!("expected role=modules, got '{entry}'"),
            })?;
            let modules = split_list(modules)
                .iter()
                .map(|m| {
                    m.parse::<Module>().map_err(|e| ConfigError::Invalid {
                        key: "ROLE_MODULES",
                        message: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((role.trim().to_string(), modules))
        })
        .collect()
}
