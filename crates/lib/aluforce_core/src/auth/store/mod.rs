//! Credential store: the seam between auth logic and persistence.
//!
//! `MySqlUserStore` backs production; `MemoryUserStore` backs tests and
//! local tooling.

pub mod memory;

use async_trait::async_trait;
use sqlx::MySqlPool;

use super::{AuthError, queries};
use crate::models::auth::{Module, UserStatus, UserWithPassword};

pub use memory::MemoryUserStore;

/// Read/write access to users and module grants.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserWithPassword>, AuthError>;

    /// Whether an explicit grant row exists. Absence means denied.
    async fn has_module_grant(&self, user_id: i64, module: Module) -> Result<bool, AuthError>;

    /// Modules with explicit grants, sorted.
    async fn granted_modules(&self, user_id: i64) -> Result<Vec<Module>, AuthError>;

    async fn grant_module(&self, user_id: i64, module: Module) -> Result<(), AuthError>;

    async fn revoke_module(&self, user_id: i64, module: Module) -> Result<(), AuthError>;

    async fn set_status(&self, user_id: i64, status: UserStatus) -> Result<(), AuthError>;

    /// Store a new hash. `temporary` marks a password that must be replaced
    /// after the next login; a user's own change clears it.
    async fn set_password_hash(
        &self,
        user_id: i64,
        password_hash: &str,
        temporary: bool,
    ) -> Result<(), AuthError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), AuthError>;
}

/// `UserStore` over a shared MySQL connection pool.
#[derive(Debug, Clone)]
pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        queries::find_user_by_email(&self.pool, email).await
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserWithPassword>, AuthError> {
        queries::find_user_by_id(&self.pool, user_id).await
    }

    async fn has_module_grant(&self, user_id: i64, module: Module) -> Result<bool, AuthError> {
        queries::has_module_grant(&self.pool, user_id, module).await
    }

    async fn granted_modules(&self, user_id: i64) -> Result<Vec<Module>, AuthError> {
        queries::granted_modules(&self.pool, user_id).await
    }

    async fn grant_module(&self, user_id: i64, module: Module) -> Result<(), AuthError> {
        queries::grant_module(&self.pool, user_id, module).await
    }

    async fn revoke_module(&self, user_id: i64, module: Module) -> Result<(), AuthError> {
        queries::revoke_module(&self.pool, user_id, module).await
    }

    async fn set_status(&self, user_id: i64, status: UserStatus) -> Result<(), AuthError> {
        queries::set_user_status(&self.pool, user_id, status).await
    }

    async fn set_password_hash(
        &self,
        user_id: i64,
        password_hash: &str,
        temporary: bool,
    ) -> Result<(), AuthError> {
        queries::set_password_hash(&self.pool, user_id, password_hash, temporary).await
    }

    async fn ping(&self) -> Result<(), AuthError> {
        crate::db::ping(&self.pool).await.map_err(AuthError::from)
    }
}
