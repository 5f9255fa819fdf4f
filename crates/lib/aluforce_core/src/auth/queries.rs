//! Auth-related MySQL queries against the legacy `usuarios` and
//! `permissoes_modulos` tables.

use sqlx::MySqlPool;
use tracing::debug;

use super::AuthError;
use crate::models::auth::{Module, User, UserStatus, UserWithPassword};

/// (id, email, nome, senha_hash, role, status, departamento, is_admin,
/// senha_temporaria)
type UserRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

// Legacy flag columns hold 0/1 integers in some rows and 'true'/'1'
// strings in others, so they are read as text.
const USER_COLUMNS: &str = "CAST(id AS SIGNED), email, nome, senha_hash, role, status, \
     departamento, CAST(is_admin AS CHAR), CAST(senha_temporaria AS CHAR)";

fn select_user_by_email() -> String {
    format!("SELECT {USER_COLUMNS} FROM usuarios WHERE email = ? ORDER BY id ASC LIMIT 1")
}

fn select_user_by_id() -> String {
    format!("SELECT {USER_COLUMNS} FROM usuarios WHERE id = ?")
}

/// Read a legacy boolean column. NULL and anything unrecognised is false.
fn legacy_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true"))
}

fn user_from_row(row: UserRow) -> UserWithPassword {
    let (id, email, name, password_hash, role, status, department, is_admin, temporary) = row;
    UserWithPassword {
        user: User {
            id,
            email,
            name,
            role: role.unwrap_or_default(),
            status: UserStatus::from_db(status.as_deref()),
            department,
            is_admin: legacy_flag(is_admin.as_deref()),
        },
        password_hash,
        temporary_password: legacy_flag(temporary.as_deref()),
    }
}

/// Fetch a user (with hash) by exact email.
pub async fn find_user_by_email(
    pool: &MySqlPool,
    email: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&select_user_by_email())
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(user_from_row))
}

/// Fetch a user (with hash) by ID.
pub async fn find_user_by_id(
    pool: &MySqlPool,
    user_id: i64,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&select_user_by_id())
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(user_from_row))
}

/// Check whether an explicit grant row exists for (user, module).
pub async fn has_module_grant(
    pool: &MySqlPool,
    user_id: i64,
    module: Module,
) -> Result<bool, AuthError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM permissoes_modulos \
         WHERE usuario_id = ? AND LOWER(modulo) = ? AND visualizar = 1",
    )
    .bind(user_id)
    .bind(module.as_str())
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// List the modules a user holds explicit grants for. Unknown module names
/// in the table are skipped.
pub async fn granted_modules(pool: &MySqlPool, user_id: i64) -> Result<Vec<Module>, AuthError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT modulo FROM permissoes_modulos WHERE usuario_id = ? AND visualizar = 1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut modules: Vec<Module> = rows
        .iter()
        .filter_map(|name| match name.parse::<Module>() {
            Ok(m) => Some(m),
            Err(_) => {
                debug!(user_id, module = %name, "skipping unknown module grant");
                None
            }
        })
        .collect();
    modules.sort();
    modules.dedup();
    Ok(modules)
}

/// Grant module access (idempotent).
pub async fn grant_module(pool: &MySqlPool, user_id: i64, module: Module) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO permissoes_modulos (usuario_id, modulo, visualizar) VALUES (?, ?, 1) \
         ON DUPLICATE KEY UPDATE visualizar = 1",
    )
    .bind(user_id)
    .bind(module.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Revoke module access. Other permission columns on the row are left alone.
pub async fn revoke_module(
    pool: &MySqlPool,
    user_id: i64,
    module: Module,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE permissoes_modulos SET visualizar = 0 \
         WHERE usuario_id = ? AND LOWER(modulo) = ?",
    )
    .bind(user_id)
    .bind(module.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Set the account status flag.
pub async fn set_user_status(
    pool: &MySqlPool,
    user_id: i64,
    status: UserStatus,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE usuarios SET status = ? WHERE id = ?")
        .bind(status.as_db_str())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replace the stored password hash and set the temporary flag.
pub async fn set_password_hash(
    pool: &MySqlPool,
    user_id: i64,
    password_hash: &str,
    temporary: bool,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE usuarios SET senha_hash = ?, senha_temporaria = ? WHERE id = ?")
        .bind(password_hash)
        .bind(temporary)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
