//! Authentication service: login, identity and password change flows over
//! `aluforce_core::auth`.

use aluforce_core::auth::jwt::{IssuedToken, TokenService};
use aluforce_core::auth::password;
use aluforce_core::auth::permissions::PermissionResolver;
use aluforce_core::auth::store::UserStore;
use aluforce_core::config::LoginSettings;
use aluforce_core::models::auth::{User, UserWithPassword};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::MeResponse;

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub issued: IssuedToken,
    /// The password used was temporary and must be replaced.
    pub force_password_change: bool,
}

// ---------------------------------------------------------------------------
// Password checks (bcrypt is CPU bound, keep it off the async workers)
// ---------------------------------------------------------------------------

async fn verify_blocking(plain: &str, hash: &str) -> AppResult<bool> {
    let (plain, hash) = (plain.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verify task: {e}")))?
        .map_err(AppError::from)
}

async fn dummy_verify_blocking(plain: &str) -> AppResult<()> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || password::verify_dummy(&plain))
        .await
        .map_err(|e| AppError::Internal(format!("password verify task: {e}")))
}

async fn hash_blocking(plain: &str) -> AppResult<String> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(format!("password hash task: {e}")))?
        .map_err(AppError::from)
}

/// Check `plain` against the stored hash of `record`.
///
/// Missing or non-bcrypt hashes are refused the same way as a wrong
/// password.
async fn check_password(record: &UserWithPassword, plain: &str) -> AppResult<bool> {
    match record.password_hash.as_deref() {
        Some(hash) if password::is_bcrypt_hash(hash) => verify_blocking(plain, hash).await,
        _ => {
            warn!(user_id = record.user.id, "stored password is not a bcrypt hash");
            dummy_verify_blocking(plain).await?;
            Ok(false)
        }
    }
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Authenticate with email (or bare login) + password.
///
/// Unknown accounts and wrong passwords both end in
/// [`AppError::InvalidCredentials`] after one bcrypt verification.
pub async fn login(
    store: &dyn UserStore,
    tokens: &TokenService,
    rules: &LoginSettings,
    email: &str,
    plain: &str,
) -> AppResult<LoginOutcome> {
    let Some(email) = rules.normalize_email(email) else {
        debug!("login identifier rejected by domain rules");
        dummy_verify_blocking(plain).await?;
        return Err(AppError::InvalidCredentials);
    };

    let Some(record) = store.find_by_email(&email).await? else {
        dummy_verify_blocking(plain).await?;
        return Err(AppError::InvalidCredentials);
    };

    if !record.user.status.is_active() {
        info!(
            user_id = record.user.id,
            status = %record.user.status,
            "login refused for disabled account"
        );
        return Err(AppError::AccountDisabled);
    }

    if !check_password(&record, plain).await? {
        return Err(AppError::InvalidCredentials);
    }

    let device_id = Uuid::new_v4().to_string();
    let issued = tokens.issue(&record.user, &device_id)?;
    info!(
        user_id = record.user.id,
        device_id = %device_id,
        temporary_password = record.temporary_password,
        "login succeeded"
    );

    Ok(LoginOutcome {
        user: record.user,
        issued,
        force_password_change: record.temporary_password,
    })
}

/// Identity of the authenticated caller, with the modules they may open.
pub async fn identity(
    permissions: &PermissionResolver,
    auth: &AuthenticatedUser,
) -> AppResult<MeResponse> {
    let modules = permissions.accessible_modules(&auth.user).await?;
    Ok(MeResponse {
        id: auth.user.id,
        name: auth.user.name.clone(),
        email: auth.user.email.clone(),
        role: auth.user.role.clone(),
        department: auth.user.department.clone(),
        device_id: auth.claims.device_id.clone(),
        modules,
    })
}

/// Replace the caller's password.
///
/// The current password must be given and match, unless the stored one is
/// temporary: a session opened with a temporary password may replace it
/// directly. The new password is never temporary.
pub async fn change_password(
    store: &dyn UserStore,
    user: &User,
    current: Option<&str>,
    new: &str,
) -> AppResult<()> {
    password::validate_new_password(new)?;

    let record = store
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    if !record.temporary_password {
        let current = current
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Validation("currentPassword is required".into()))?;
        if !check_password(&record, current).await? {
            return Err(AppError::InvalidCredentials);
        }
    }

    let hash = hash_blocking(new).await?;
    store.set_password_hash(user.id, &hash, false).await?;
    info!(
        user_id = user.id,
        was_temporary = record.temporary_password,
        "password changed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use aluforce_core::auth::store::MemoryUserStore;
    use aluforce_core::config::TokenSettings;
    use aluforce_core::models::auth::UserStatus;

    use super::*;

    const COST: u32 = 4;

    fn tokens() -> TokenService {
        TokenService::new(&TokenSettings {
            secret: "unit-test-secret".into(),
            audience: "aluforce".into(),
            ttl_secs: 60,
        })
    }

    async fn store_with(status: UserStatus, hash: Option<String>) -> MemoryUserStore {
        let store = MemoryUserStore::new();
        store
            .insert_user(
                User {
                    id: 7,
                    email: "ana@aluforce.ind.br".into(),
                    name: Some("Ana".into()),
                    role: "user".into(),
                    status,
                    department: None,
                    is_admin: false,
                },
                hash,
            )
            .await;
        store
    }

    fn hash(plain: &str) -> Option<String> {
        Some(password::hash_password_with_cost(plain, COST).unwrap())
    }

    #[tokio::test]
    async fn bare_login_gets_default_domain() {
        let store = store_with(UserStatus::Active, hash("pw123456")).await;
        let login_settings = LoginSettings {
            default_domain: Some("aluforce.ind.br".into()),
            allowed_domains: vec![],
        };
        let outcome = login(&store, &tokens(), &login_settings, "ana", "pw123456")
            .await
            .unwrap();
        assert_eq!(outcome.user.id, 7);
        assert_eq!(outcome.issued.claims.id, 7);
    }

    #[tokio::test]
    async fn disallowed_domain_is_generic_failure() {
        let store = store_with(UserStatus::Active, hash("pw123456")).await;
        let login_settings = LoginSettings {
            default_domain: None,
            allowed_domains: vec!["other.com".into()],
        };
        let err = login(&store, &tokens(), &login_settings, "ana@aluforce.ind.br", "pw123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn plaintext_stored_password_is_refused() {
        let store = store_with(UserStatus::Active, Some("pw123456".into())).await;
        let err = login(
            &store,
            &tokens(),
            &LoginSettings::default(),
            "ana@aluforce.ind.br",
            "pw123456",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn disabled_account_is_refused_before_password_check() {
        let store = store_with(UserStatus::Blocked, hash("pw123456")).await;
        let err = login(
            &store,
            &tokens(),
            &LoginSettings::default(),
            "ana@aluforce.ind.br",
            "wrong",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::AccountDisabled));
    }

    #[tokio::test]
    async fn each_login_gets_a_new_device_id() {
        let store = store_with(UserStatus::Active, hash("pw123456")).await;
        let settings = LoginSettings::default();
        let a = login(&store, &tokens(), &settings, "ana@aluforce.ind.br", "pw123456")
            .await
            .unwrap();
        let b = login(&store, &tokens(), &settings, "ana@aluforce.ind.br", "pw123456")
            .await
            .unwrap();
        assert_ne!(a.issued.claims.device_id, b.issued.claims.device_id);
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let store = store_with(UserStatus::Active, hash("old-pass")).await;
        let user = store.find_by_id(7).await.unwrap().unwrap().user;

        let err = change_password(&store, &user, Some("nope"), "new-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = change_password(&store, &user, None, "new-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = change_password(&store, &user, Some("old-pass"), "123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        change_password(&store, &user, Some("old-pass"), "new-pass")
            .await
            .unwrap();
        let stored = store.find_by_id(7).await.unwrap().unwrap().password_hash.unwrap();
        assert!(password::verify_password("new-pass", &stored).unwrap());
    }

    #[tokio::test]
    async fn temporary_password_forces_change_then_clears() {
        let store = store_with(UserStatus::Active, None).await;
        let temp = password::hash_password_with_cost("temp-1234", COST).unwrap();
        store.set_password_hash(7, &temp, true).await.unwrap();

        let settings = LoginSettings::default();
        let outcome = login(&store, &tokens(), &settings, "ana@aluforce.ind.br", "temp-1234")
            .await
            .unwrap();
        assert!(outcome.force_password_change);

        change_password(&store, &outcome.user, None, "definitiva")
            .await
            .unwrap();
        assert!(!store.find_by_id(7).await.unwrap().unwrap().temporary_password);

        let outcome = login(&store, &tokens(), &settings, "ana@aluforce.ind.br", "definitiva")
            .await
            .unwrap();
        assert!(!outcome.force_password_change);
    }
}
