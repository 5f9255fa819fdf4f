//! Module permission handlers for the current user.

use aluforce_core::models::auth::Module;
use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ApiPath;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ModuleAccessResponse, PermissionsResponse};

/// Parse a module path segment; unknown names are 404.
pub(crate) fn parse_module(raw: &str) -> AppResult<Module> {
    raw.parse::<Module>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

/// `GET /api/permissions`
pub async fn permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<PermissionsResponse>> {
    let modules = state.permissions.accessible_modules(&user.user).await?;
    Ok(Json(PermissionsResponse {
        is_admin: state.permissions.is_admin(&user.user),
        modules,
    }))
}

/// `GET /api/modules/{module}/access`: 200 when granted, 403 otherwise.
pub async fn module_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(module): ApiPath<String>,
) -> AppResult<Json<ModuleAccessResponse>> {
    let module = parse_module(&module)?;
    if !state.permissions.has_access_for(&user.user, module).await? {
        return Err(AppError::ModuleDenied(module.to_string()));
    }
    Ok(Json(ModuleAccessResponse {
        module,
        granted: true,
    }))
}
