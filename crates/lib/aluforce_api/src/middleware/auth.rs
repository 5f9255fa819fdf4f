//! Authentication middleware: token extraction, verification and the
//! per-request account check.

use aluforce_core::auth::permissions::PermissionResolver;
use aluforce_core::models::auth::{Module, TokenClaims, User};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies;

/// Stored in request extensions once a request is authenticated.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Fresh user row, loaded on this request.
    pub user: User,
    /// Claims of the presented token.
    pub claims: TokenClaims,
}

/// Token from `Authorization: Bearer`, then the `authToken` cookie, then
/// the `token` cookie.
///
/// Front-end code sometimes sends `Bearer null` or `Bearer undefined`; those
/// count as no header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "null" && *t != "undefined");
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    cookies::session_token(&CookieJar::from_headers(headers))
}

/// Axum middleware: verifies the session token, reloads the user, refuses
/// disabled accounts and injects [`AuthenticatedUser`] into request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or(AppError::MissingToken)?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        debug!(reason = %e, "token rejected");
        AppError::InvalidOrExpiredToken
    })?;

    let record = state
        .store
        .find_by_id(claims.id)
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;

    if !record.user.status.is_active() {
        warn!(
            user_id = record.user.id,
            status = %record.user.status,
            "token presented for disabled account"
        );
        return Err(AppError::AccountDisabled);
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user: record.user,
        claims,
    });

    Ok(next.run(request).await)
}

/// Axum middleware layered inside [`require_auth`]: only manager roles pass.
pub async fn require_manager(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AppError::MissingToken)?;

    if !state.permissions.can_manage(&auth.user) {
        warn!(user_id = auth.user.id, role = %auth.user.role, "manager route refused");
        return Err(AppError::InsufficientRole);
    }

    Ok(next.run(request).await)
}

/// State for [`require_module`]: one guard per protected ERP area.
#[derive(Clone)]
pub struct ModuleGuard {
    pub permissions: PermissionResolver,
    pub module: Module,
}

/// Axum middleware layered inside [`require_auth`] for module routes.
///
/// ```ignore
/// Router::new()
///     .route("/api/vendas/pedidos", get(list_orders))
///     .layer(from_fn_with_state(state.module_guard(Module::Vendas), require_module))
///     .layer(from_fn_with_state(state.clone(), require_auth));
/// ```
pub async fn require_module(
    State(guard): State<ModuleGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Clone out of the request: the body is not Sync, so no borrow may be
    // held across the await below.
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|auth| auth.user.clone())
        .ok_or(AppError::MissingToken)?;

    if !guard.permissions.has_access_for(&user, guard.module).await? {
        debug!(user_id = user.id, module = %guard.module, "module access denied");
        return Err(AppError::ModuleDenied(guard.module.to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(
                axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                v.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn bearer_header_wins() {
        let h = headers(&[("authorization", "Bearer abc"), ("cookie", "authToken=xyz")]);
        assert_eq!(extract_token(&h).as_deref(), Some("abc"));
    }

    #[test]
    fn null_bearer_falls_back_to_cookie() {
        for bogus in ["Bearer null", "Bearer undefined", "Bearer  "] {
            let h = headers(&[("authorization", bogus), ("cookie", "authToken=xyz")]);
            assert_eq!(extract_token(&h).as_deref(), Some("xyz"));
        }
    }

    #[test]
    fn other_schemes_are_ignored() {
        let h = headers(&[("authorization", "Basic dXNlcjpwdw==")]);
        assert_eq!(extract_token(&h), None);
    }

    #[test]
    fn nothing_presented() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
