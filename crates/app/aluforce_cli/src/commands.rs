//! Command implementations. Database commands take a `UserStore` so they
//! run the same against MySQL and the in-memory store.

use std::io::{BufRead, Write};
use std::sync::Arc;

use aluforce_core::auth::password;
use aluforce_core::auth::permissions::{AccessPolicy, PermissionResolver};
use aluforce_core::auth::store::UserStore;
use aluforce_core::models::auth::{Module, User, UserStatus};

use crate::{Error, Result};

/// Read one line (the secret) from `input`, without its line ending.
pub fn read_secret(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        return Err(Error::Custom("no password given on stdin".into()));
    }
    Ok(secret)
}

pub fn hash_password(cost: u32, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let secret = read_secret(input)?;
    password::validate_new_password(&secret)?;
    let hash = password::hash_password_with_cost(&secret, cost)?;
    writeln!(out, "{hash}")?;
    Ok(())
}

async fn find_user(store: &dyn UserStore, email: &str) -> Result<User> {
    store
        .find_by_email(email)
        .await?
        .map(|record| record.user)
        .ok_or_else(|| Error::Custom(format!("no user with email {email}")))
}

pub async fn set_password(
    store: &dyn UserStore,
    email: &str,
    temporary: bool,
    input: &mut impl BufRead,
) -> Result<()> {
    let user = find_user(store, email).await?;
    let secret = read_secret(input)?;
    password::validate_new_password(&secret)?;
    let hash = password::hash_password(&secret)?;
    store.set_password_hash(user.id, &hash, temporary).await?;
    log::info!("password updated for user {} (temporary: {temporary})", user.id);
    Ok(())
}

pub async fn set_status(
    store: &dyn UserStore,
    email: &str,
    status: UserStatus,
    out: &mut impl Write,
) -> Result<()> {
    let user = find_user(store, email).await?;
    store.set_status(user.id, status).await?;
    log::info!("status of user {} changed from {} to {}", user.id, user.status, status);
    writeln!(out, "{email}: {status}")?;
    Ok(())
}

pub async fn grant(
    store: &dyn UserStore,
    email: &str,
    module: Module,
    out: &mut impl Write,
) -> Result<()> {
    let user = find_user(store, email).await?;
    store.grant_module(user.id, module).await?;
    log::info!("granted {module} to user {}", user.id);
    writeln!(out, "{email}: +{module}")?;
    Ok(())
}

pub async fn revoke(
    store: &dyn UserStore,
    email: &str,
    module: Module,
    out: &mut impl Write,
) -> Result<()> {
    let user = find_user(store, email).await?;
    store.revoke_module(user.id, module).await?;
    log::info!("revoked {module} from user {}", user.id);
    writeln!(out, "{email}: -{module}")?;
    Ok(())
}

/// Print role, status and effective modules.
pub async fn modules(
    store: Arc<dyn UserStore>,
    policy: AccessPolicy,
    email: &str,
    out: &mut impl Write,
) -> Result<()> {
    let user = find_user(store.as_ref(), email).await?;
    let resolver = PermissionResolver::new(store, Arc::new(policy));
    let modules = resolver.accessible_modules(&user).await?;

    writeln!(out, "user:   {} ({})", user.email, user.id)?;
    writeln!(out, "role:   {}", user.role)?;
    writeln!(out, "status: {}", user.status)?;
    if resolver.is_admin(&user) {
        writeln!(out, "admin:  yes")?;
    }
    let names: Vec<&str> = modules.iter().map(|m| m.as_str()).collect();
    writeln!(out, "modules: {}", names.join(", "))?;
    Ok(())
}
