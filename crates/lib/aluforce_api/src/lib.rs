//! # aluforce_api
//!
//! HTTP API library for the Aluforce auth service.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use aluforce_core::auth::jwt::TokenService;
use aluforce_core::auth::permissions::PermissionResolver;
use aluforce_core::auth::store::UserStore;
use aluforce_core::models::auth::Module;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, health, modules};
use crate::middleware::auth::{ModuleGuard, require_auth, require_manager};

/// Route paths.
pub mod routes {
    pub const POST_LOGIN: &str = "/api/login";
    pub const POST_LOGOUT: &str = "/api/logout";
    pub const GET_HEALTH: &str = "/api/health";
    pub const GET_ME: &str = "/api/me";
    pub const POST_ME_PASSWORD: &str = "/api/me/password";
    pub const GET_PERMISSIONS: &str = "/api/permissions";
    pub const GET_MODULE_ACCESS: &str = "/api/modules/{module}/access";
    pub const ADMIN_USER_MODULES: &str = "/api/admin/users/{id}/modules";
    pub const ADMIN_USER_MODULE: &str = "/api/admin/users/{id}/modules/{module}";
    pub const ADMIN_USER_STATUS: &str = "/api/admin/users/{id}/status";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users and module grants.
    pub store: Arc<dyn UserStore>,
    /// Session token signer/verifier.
    pub tokens: Arc<TokenService>,
    /// Module access decisions.
    pub permissions: PermissionResolver,
    /// API configuration.
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(config: ApiConfig, store: Arc<dyn UserStore>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.auth.token));
        let permissions =
            PermissionResolver::new(store.clone(), Arc::new(config.auth.policy.clone()));
        Self {
            store,
            tokens,
            permissions,
            config: Arc::new(config),
        }
    }

    /// State for a [`middleware::auth::require_module`] layer.
    pub fn module_guard(&self, module: Module) -> ModuleGuard {
        ModuleGuard {
            permissions: self.permissions.clone(),
            module,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::POST_LOGIN, post(auth::login_handler))
        .route(routes::POST_LOGOUT, post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_ME, get(auth::me_handler))
        .route(routes::POST_ME_PASSWORD, post(auth::change_password_handler))
        .route(routes::GET_PERMISSIONS, get(modules::permissions_handler))
        .route(routes::GET_MODULE_ACCESS, get(modules::module_access_handler))
        .layer(from_fn_with_state(state.clone(), require_auth));

    // Manager routes (require auth + manager role)
    let admin = Router::new()
        .route(routes::ADMIN_USER_MODULES, get(admin::list_user_modules_handler))
        .route(
            routes::ADMIN_USER_MODULE,
            put(admin::grant_module_handler).delete(admin::revoke_module_handler),
        )
        .route(routes::ADMIN_USER_STATUS, put(admin::set_status_handler))
        .layer(from_fn_with_state(state.clone(), require_manager))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
