//! In-process `UserStore`.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::UserStore;
use crate::auth::AuthError;
use crate::models::auth::{Module, User, UserStatus, UserWithPassword};

/// Users and grants held in memory.
///
/// `set_unavailable(true)` makes every call fail the way an exhausted
/// connection pool does.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<i64, UserWithPassword>>,
    grants: RwLock<BTreeSet<(i64, Module)>>,
    unavailable: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub async fn insert_user(&self, user: User, password_hash: Option<String>) {
        self.users.write().await.insert(
            user.id,
            UserWithPassword {
                user,
                password_hash,
                temporary_password: false,
            },
        );
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::DbError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        self.check_available()?;
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.user.email == email)
            .min_by_key(|u| u.user.id)
            .cloned())
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserWithPassword>, AuthError> {
        self.check_available()?;
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn has_module_grant(&self, user_id: i64, module: Module) -> Result<bool, AuthError> {
        self.check_available()?;
        Ok(self.grants.read().await.contains(&(user_id, module)))
    }

    async fn granted_modules(&self, user_id: i64) -> Result<Vec<Module>, AuthError> {
        self.check_available()?;
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, m)| *m)
            .collect())
    }

    async fn grant_module(&self, user_id: i64, module: Module) -> Result<(), AuthError> {
        self.check_available()?;
        self.grants.write().await.insert((user_id, module));
        Ok(())
    }

    async fn revoke_module(&self, user_id: i64, module: Module) -> Result<(), AuthError> {
        self.check_available()?;
        self.grants.write().await.remove(&(user_id, module));
        Ok(())
    }

    async fn set_status(&self, user_id: i64, status: UserStatus) -> Result<(), AuthError> {
        self.check_available()?;
        if let Some(record) = self.users.write().await.get_mut(&user_id) {
            record.user.status = status;
        }
        Ok(())
    }

    async fn set_password_hash(
        &self,
        user_id: i64,
        password_hash: &str,
        temporary: bool,
    ) -> Result<(), AuthError> {
        self.check_available()?;
        if let Some(record) = self.users.write().await.get_mut(&user_id) {
            record.password_hash = Some(password_hash.to_string());
            record.temporary_password = temporary;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AuthError> {
        self.check_available()
    }
}
