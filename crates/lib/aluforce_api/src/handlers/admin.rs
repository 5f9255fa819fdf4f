//! User administration handlers (manager roles only).

use aluforce_core::models::auth::{User, UserStatus};
use axum::extract::State;
use axum::{Extension, Json};
use tracing::info;

use super::modules::parse_module;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{SetStatusRequest, UserModulesResponse, UserStatusResponse};

async fn load_user(state: &AppState, user_id: i64) -> AppResult<User> {
    state
        .store
        .find_by_id(user_id)
        .await?
        .map(|record| record.user)
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))
}

async fn modules_response(state: &AppState, user_id: i64) -> AppResult<Json<UserModulesResponse>> {
    let modules = state.store.granted_modules(user_id).await?;
    Ok(Json(UserModulesResponse { user_id, modules }))
}

/// `GET /api/admin/users/{id}/modules`: explicit grants of a user.
pub async fn list_user_modules_handler(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<Json<UserModulesResponse>> {
    load_user(&state, user_id).await?;
    modules_response(&state, user_id).await
}

/// `PUT /api/admin/users/{id}/modules/{module}`
pub async fn grant_module_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiPath((user_id, module)): ApiPath<(i64, String)>,
) -> AppResult<Json<UserModulesResponse>> {
    let module = parse_module(&module)?;
    load_user(&state, user_id).await?;
    state.store.grant_module(user_id, module).await?;
    info!(actor_id = actor.user.id, user_id, %module, "module granted");
    modules_response(&state, user_id).await
}

/// `DELETE /api/admin/users/{id}/modules/{module}`
pub async fn revoke_module_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiPath((user_id, module)): ApiPath<(i64, String)>,
) -> AppResult<Json<UserModulesResponse>> {
    let module = parse_module(&module)?;
    load_user(&state, user_id).await?;
    state.store.revoke_module(user_id, module).await?;
    info!(actor_id = actor.user.id, user_id, %module, "module revoked");
    modules_response(&state, user_id).await
}

/// `PUT /api/admin/users/{id}/status`
///
/// Disabling takes effect on the user's next request: every protected
/// route reloads the status.
pub async fn set_status_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(body): ApiJson<SetStatusRequest>,
) -> AppResult<Json<UserStatusResponse>> {
    let status = body
        .status
        .parse::<UserStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if user_id == actor.user.id && !status.is_active() {
        return Err(AppError::Validation("You cannot disable your own account".into()));
    }

    load_user(&state, user_id).await?;
    state.store.set_status(user_id, status).await?;
    info!(actor_id = actor.user.id, user_id, %status, "user status changed");
    Ok(Json(UserStatusResponse { user_id, status }))
}
