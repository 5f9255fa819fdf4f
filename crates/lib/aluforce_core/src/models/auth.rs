//! Authentication domain models.
//!
//! These map the legacy `usuarios` / `permissoes_modulos` columns onto typed
//! values. API-facing shapes live in `aluforce_api::models`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account status flag stored on `usuarios.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[serde(alias = "ativo")]
    Active,
    #[serde(alias = "inativo", alias = "desativado", alias = "disabled")]
    Inactive,
    #[serde(alias = "demitido")]
    Dismissed,
    #[serde(alias = "bloqueado")]
    Blocked,
}

/// A status string that is neither a known English nor Portuguese spelling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown user status: {0}")]
pub struct UnknownStatus(pub String);

impl UserStatus {
    /// Parse the raw column value.
    ///
    /// Legacy rows carry NULL, empty strings or free text here; anything that
    /// is not an explicit disabling value counts as active.
    pub fn from_db(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or(UserStatus::Active)
    }

    /// Value written back to `usuarios.status`.
    pub fn as_db_str(self) -> &'static str {
        match self {
            UserStatus::Active => "ativo",
            UserStatus::Inactive => "inativo",
            UserStatus::Dismissed => "demitido",
            UserStatus::Blocked => "bloqueado",
        }
    }

    pub fn is_active(self) -> bool {
        self == UserStatus::Active
    }
}

impl FromStr for UserStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "ativo" => Ok(UserStatus::Active),
            "inactive" | "inativo" | "desativado" | "disabled" => Ok(UserStatus::Inactive),
            "dismissed" | "demitido" => Ok(UserStatus::Dismissed),
            "blocked" | "bloqueado" => Ok(UserStatus::Blocked),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Dismissed => "dismissed",
            UserStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// ERP module (area) guarded by the permission resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    /// Sales.
    Vendas,
    /// Purchasing.
    Compras,
    /// Finance.
    Financeiro,
    /// Human resources.
    Rh,
    /// Production planning and control.
    Pcp,
    /// Invoicing.
    Faturamento,
    /// Electronic invoices.
    Nfe,
    /// IT administration.
    Ti,
}

/// A module name that does not match any ERP area.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown module: {0}")]
pub struct UnknownModule(pub String);

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Vendas,
        Module::Compras,
        Module::Financeiro,
        Module::Rh,
        Module::Pcp,
        Module::Faturamento,
        Module::Nfe,
        Module::Ti,
    ];

    /// Name as stored in `permissoes_modulos.modulo`.
    pub fn as_str(self) -> &'static str {
        match self {
            Module::Vendas => "vendas",
            Module::Compras => "compras",
            Module::Financeiro => "financeiro",
            Module::Rh => "rh",
            Module::Pcp => "pcp",
            Module::Faturamento => "faturamento",
            Module::Nfe => "nfe",
            Module::Ti => "ti",
        }
    }
}

impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| UnknownModule(s.to_string()))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalise a role string for comparison against policy tables.
pub fn normalize_role(role: &str) -> String {
    role.trim().to_lowercase()
}

/// Domain user (no credentials).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub status: UserStatus,
    pub department: Option<String>,
    /// Legacy `usuarios.is_admin` flag. Grants every module whatever the role.
    #[serde(default)]
    pub is_admin: bool,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: Option<String>,
    /// `usuarios.senha_temporaria`: the password was set by an administrator
    /// and must be replaced after the next login.
    pub temporary_password: bool,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// User id (`usuarios.id`).
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    /// Per-login device identifier (UUID v4).
    pub device_id: String,
    /// Audience: the deployment this token is valid for.
    pub aud: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_db_treats_unknown_as_active() {
        assert_eq!(UserStatus::from_db(None), UserStatus::Active);
        assert_eq!(UserStatus::from_db(Some("")), UserStatus::Active);
        assert_eq!(UserStatus::from_db(Some("ativo")), UserStatus::Active);
        assert_eq!(UserStatus::from_db(Some("whatever")), UserStatus::Active);
    }

    #[test]
    fn status_from_db_reads_portuguese_values() {
        assert_eq!(UserStatus::from_db(Some("Demitido")), UserStatus::Dismissed);
        assert_eq!(UserStatus::from_db(Some(" inativo ")), UserStatus::Inactive);
        assert_eq!(UserStatus::from_db(Some("desativado")), UserStatus::Inactive);
        assert_eq!(UserStatus::from_db(Some("BLOQUEADO")), UserStatus::Blocked);
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert!("on-leave".parse::<UserStatus>().is_err());
    }

    #[test]
    fn status_deserializes_aliases() {
        let s: UserStatus = serde_json::from_str("\"demitido\"").unwrap();
        assert_eq!(s, UserStatus::Dismissed);
        let s: UserStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(s, UserStatus::Inactive);
    }

    #[test]
    fn module_parse_is_case_insensitive() {
        assert_eq!("Vendas".parse::<Module>().unwrap(), Module::Vendas);
        assert_eq!(" RH ".parse::<Module>().unwrap(), Module::Rh);
        assert!("marketing".parse::<Module>().is_err());
    }

    #[test]
    fn claims_use_camel_case_device_id() {
        let claims = TokenClaims {
            id: 7,
            name: Some("Ana".into()),
            email: "ana@aluforce.ind.br".into(),
            role: "user".into(),
            device_id: "d-1".into(),
            aud: "aluforce".into(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["deviceId"], "d-1");
        assert_eq!(json["aud"], "aluforce");
    }
}
