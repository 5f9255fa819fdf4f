//! Module access resolution.
//!
//! Decision order for `has_access(user, module)`:
//!
//! 1. unknown or non-active user → denied
//! 2. legacy admin flag set, or role in the admin set → granted (explicit
//!    denials are not consulted)
//! 3. role's static module list contains the module → granted
//! 4. explicit grant row → granted, otherwise denied

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use super::AuthError;
use super::store::UserStore;
use crate::models::auth::{Module, User, normalize_role};

/// Roles that see every module.
pub const DEFAULT_ADMIN_ROLES: &[&str] = &[
    "admin",
    "administrador",
    "ti",
    "diretoria",
    "financeiro",
    "rh",
];

/// Roles allowed to change other users' grants and status.
pub const DEFAULT_MANAGER_ROLES: &[&str] = &["admin", "administrador", "ti"];

/// The single table of role rules used by every route.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_roles: BTreeSet<String>,
    manager_roles: BTreeSet<String>,
    role_modules: BTreeMap<String, BTreeSet<Module>>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            admin_roles: DEFAULT_ADMIN_ROLES.iter().map(|r| r.to_string()).collect(),
            manager_roles: DEFAULT_MANAGER_ROLES.iter().map(|r| r.to_string()).collect(),
            role_modules: BTreeMap::new(),
        }
    }
}

impl AccessPolicy {
    /// Replace the admin-equivalent role set.
    pub fn with_admin_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admin_roles = roles.into_iter().map(|r| normalize_role(r.as_ref())).collect();
        self
    }

    /// Replace the manager role set.
    pub fn with_manager_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.manager_roles = roles.into_iter().map(|r| normalize_role(r.as_ref())).collect();
        self
    }

    /// Add static modules for a role.
    pub fn with_role_modules<I>(mut self, role: &str, modules: I) -> Self
    where
        I: IntoIterator<Item = Module>,
    {
        self.role_modules
            .entry(normalize_role(role))
            .or_default()
            .extend(modules);
        self
    }

    pub fn is_admin(&self, role: &str) -> bool {
        self.admin_roles.contains(&normalize_role(role))
    }

    pub fn is_manager(&self, role: &str) -> bool {
        self.manager_roles.contains(&normalize_role(role))
    }

    /// Whether the role's static table includes `module`.
    pub fn role_grants(&self, role: &str, module: Module) -> bool {
        self.role_modules
            .get(&normalize_role(role))
            .is_some_and(|mods| mods.contains(&module))
    }

    fn static_modules(&self, role: &str) -> impl Iterator<Item = Module> + '_ {
        self.role_modules
            .get(&normalize_role(role))
            .into_iter()
            .flat_map(|mods| mods.iter().copied())
    }
}

/// Answers "may this user open this module?" against the policy and the
/// grant table.
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn UserStore>,
    policy: Arc<AccessPolicy>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn UserStore>, policy: Arc<AccessPolicy>) -> Self {
        Self { store, policy }
    }

    /// Admin by legacy flag or by role.
    pub fn is_admin(&self, user: &User) -> bool {
        user.is_admin || self.policy.is_admin(&user.role)
    }

    /// Resolve access by user ID. Unknown users are denied.
    pub async fn has_access(&self, user_id: i64, module: Module) -> Result<bool, AuthError> {
        match self.store.find_by_id(user_id).await? {
            Some(record) => self.has_access_for(&record.user, module).await,
            None => {
                debug!(user_id, %module, "access check for unknown user");
                Ok(false)
            }
        }
    }

    /// Resolve access for an already-loaded user.
    pub async fn has_access_for(&self, user: &User, module: Module) -> Result<bool, AuthError> {
        if !user.status.is_active() {
            return Ok(false);
        }
        if self.is_admin(user) || self.policy.role_grants(&user.role, module) {
            return Ok(true);
        }
        self.store.has_module_grant(user.id, module).await
    }

    /// Every module the user may open, sorted.
    pub async fn accessible_modules(&self, user: &User) -> Result<Vec<Module>, AuthError> {
        if !user.status.is_active() {
            return Ok(Vec::new());
        }
        if self.is_admin(user) {
            return Ok(Module::ALL.to_vec());
        }
        let mut modules: BTreeSet<Module> = self.policy.static_modules(&user.role).collect();
        modules.extend(self.store.granted_modules(user.id).await?);
        Ok(modules.into_iter().collect())
    }

    /// Whether the user may manage other users' access.
    pub fn can_manage(&self, user: &User) -> bool {
        user.status.is_active() && self.policy.is_manager(&user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryUserStore;
    use crate::models::auth::UserStatus;

    fn user(id: i64, role: &str, status: UserStatus) -> User {
        User {
            id,
            email: format!("user{id}@aluforce.ind.br"),
            name: None,
            role: role.into(),
            status,
            department: None,
            is_admin: false,
        }
    }

    async fn resolver_with(
        users: Vec<User>,
        policy: AccessPolicy,
    ) -> (PermissionResolver, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        for u in users {
            store.insert_user(u, None).await;
        }
        let resolver = PermissionResolver::new(store.clone(), Arc::new(policy));
        (resolver, store)
    }

    #[tokio::test]
    async fn no_grant_and_no_admin_role_is_denied() {
        let (resolver, _) =
            resolver_with(vec![user(1, "user", UserStatus::Active)], AccessPolicy::default()).await;
        for module in Module::ALL {
            assert!(!resolver.has_access(1, module).await.unwrap());
        }
    }

    #[tokio::test]
    async fn explicit_grant_allows_only_that_module() {
        let (resolver, store) =
            resolver_with(vec![user(1, "user", UserStatus::Active)], AccessPolicy::default()).await;
        store.grant_module(1, Module::Vendas).await.unwrap();
        assert!(resolver.has_access(1, Module::Vendas).await.unwrap());
        assert!(!resolver.has_access(1, Module::Financeiro).await.unwrap());
    }

    #[tokio::test]
    async fn admin_roles_see_everything() {
        let (resolver, _) = resolver_with(
            vec![
                user(1, "Administrador", UserStatus::Active),
                user(2, " diretoria ", UserStatus::Active),
                user(3, "rh", UserStatus::Active),
            ],
            AccessPolicy::default(),
        )
        .await;
        for id in 1..=3 {
            assert!(resolver.has_access(id, Module::Pcp).await.unwrap());
        }
    }

    #[tokio::test]
    async fn admin_wins_over_revoked_grant() {
        let (resolver, store) =
            resolver_with(vec![user(1, "admin", UserStatus::Active)], AccessPolicy::default())
                .await;
        store.grant_module(1, Module::Nfe).await.unwrap();
        store.revoke_module(1, Module::Nfe).await.unwrap();
        assert!(resolver.has_access(1, Module::Nfe).await.unwrap());
    }

    #[tokio::test]
    async fn legacy_admin_flag_grants_everything_whatever_the_role() {
        let flagged = User {
            is_admin: true,
            ..user(1, "user", UserStatus::Active)
        };
        let (resolver, store) = resolver_with(vec![flagged], AccessPolicy::default()).await;
        assert!(resolver.has_access(1, Module::Financeiro).await.unwrap());

        let u = store.find_by_id(1).await.unwrap().unwrap().user;
        assert!(resolver.is_admin(&u));
        assert_eq!(resolver.accessible_modules(&u).await.unwrap(), Module::ALL.to_vec());
        assert!(!resolver.can_manage(&u));

        let disabled = User {
            status: UserStatus::Inactive,
            ..u
        };
        assert!(!resolver.has_access_for(&disabled, Module::Financeiro).await.unwrap());
    }

    #[tokio::test]
    async fn inactive_user_is_denied_even_as_admin() {
        let (resolver, _) = resolver_with(
            vec![user(1, "admin", UserStatus::Dismissed)],
            AccessPolicy::default(),
        )
        .await;
        assert!(!resolver.has_access(1, Module::Vendas).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_is_denied() {
        let (resolver, _) = resolver_with(vec![], AccessPolicy::default()).await;
        assert!(!resolver.has_access(99, Module::Vendas).await.unwrap());
    }

    #[tokio::test]
    async fn static_role_table_grants_listed_modules() {
        let policy = AccessPolicy::default()
            .with_role_modules("comercial", [Module::Vendas, Module::Faturamento]);
        let (resolver, store) =
            resolver_with(vec![user(1, "Comercial", UserStatus::Active)], policy).await;
        store.grant_module(1, Module::Compras).await.unwrap();

        assert!(resolver.has_access(1, Module::Vendas).await.unwrap());
        assert!(!resolver.has_access(1, Module::Rh).await.unwrap());

        let u = store.find_by_id(1).await.unwrap().unwrap().user;
        assert_eq!(
            resolver.accessible_modules(&u).await.unwrap(),
            vec![Module::Vendas, Module::Compras, Module::Faturamento]
        );
    }

    #[tokio::test]
    async fn custom_admin_roles_replace_defaults() {
        let policy = AccessPolicy::default().with_admin_roles(["gerente"]);
        let (resolver, _) = resolver_with(
            vec![
                user(1, "gerente", UserStatus::Active),
                user(2, "financeiro", UserStatus::Active),
            ],
            policy,
        )
        .await;
        assert!(resolver.has_access(1, Module::Rh).await.unwrap());
        assert!(!resolver.has_access(2, Module::Rh).await.unwrap());
    }

    #[tokio::test]
    async fn manager_check_uses_manager_roles() {
        let (resolver, _) = resolver_with(vec![], AccessPolicy::default()).await;
        assert!(resolver.can_manage(&user(1, "TI", UserStatus::Active)));
        assert!(!resolver.can_manage(&user(2, "financeiro", UserStatus::Active)));
        assert!(!resolver.can_manage(&user(3, "admin", UserStatus::Blocked)));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let (resolver, store) =
            resolver_with(vec![user(1, "user", UserStatus::Active)], AccessPolicy::default()).await;
        store.set_unavailable(true);
        assert!(resolver.has_access(1, Module::Vendas).await.is_err());
    }
}
