//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, LogoutResponse, MeResponse,
    MessageResponse, UserSummary,
};
use crate::services::{auth, cookies};

/// `POST /api/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let outcome = auth::login(
        state.store.as_ref(),
        &state.tokens,
        &state.config.auth.login,
        &body.email,
        &body.password,
    )
    .await?;

    let cookie = cookies::session_cookie(
        &outcome.issued.token,
        state.tokens.ttl_secs(),
        state.config.secure_cookies,
    );
    let resp = LoginResponse {
        device_id: outcome.issued.claims.device_id.clone(),
        token: outcome.issued.token,
        expires_in: state.tokens.ttl_secs(),
        force_password_change: outcome.force_password_change,
        user: UserSummary::from(&outcome.user),
    };
    Ok((jar.add(cookie), Json(resp)))
}

/// `POST /api/logout`: drop the session cookie. Tokens are stateless, so
/// nothing is revoked server-side.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.add(cookies::clear_session_cookie(state.config.secure_cookies));
    (jar, Json(LogoutResponse { success: true }))
}

/// `GET /api/me`
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<MeResponse>> {
    let resp = auth::identity(&state.permissions, &user).await?;
    Ok(Json(resp))
}

/// `POST /api/me/password`
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth::change_password(
        state.store.as_ref(),
        &user.user,
        body.current_password.as_deref(),
        &body.new_password,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Password updated".into(),
    }))
}
