use crate::error::WardenError;
use crate::server::guards::client::ClientAddr;
use crate::server::guards::session::{
    Operator, SessionClaims, build_session_cookie, session_removal_cookie,
};
use crate::server::router::WardenState;
use crate::service::auth::verify_administrator;
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use pgwarden_schema::{LoginRequest, LoginResponse, MessageResponse};
use tracing::{info, warn};

/// POST /auth
///
/// Verifies the credentials against PostgreSQL itself and issues the session cookie.
/// Attempts are throttled per client address and username.
pub async fn login(
    State(state): State<WardenState>,
    client: ClientAddr,
    jar: PrivateCookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(PrivateCookieJar, Extension<Operator>, Json<LoginResponse>), WardenError> {
    let Json(req) = payload?;
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(WardenError::validation("username and password are required"));
    }

    if state
        .login_limiter
        .check_key(&client.throttle_key(&req.username))
        .is_err()
    {
        warn!(username = %req.username, client = ?client.0, "Login throttled");
        return Err(WardenError::RateLimited(req.username));
    }
    state.login_limiter.retain_recent();

    verify_administrator(&state.pool, &req.username, &req.password).await?;

    let claims = SessionClaims::issue(req.username.clone(), &state.session);
    let cookie = build_session_cookie(&claims, &state.session)
        .map_err(|err| WardenError::Auth(format!("could not issue session: {err}")))?;

    info!(username = %req.username, "Administrator logged in");
    Ok((
        jar.add(cookie),
        Extension(Operator(req.username.clone())),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: req.username,
        }),
    ))
}

/// POST /auth/logout
pub async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<MessageResponse>) {
    (
        jar.remove(session_removal_cookie()),
        Json(MessageResponse::new("Logged out")),
    )
}
