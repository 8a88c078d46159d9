use crate::error::WardenError;
use crate::server::router::WardenState;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use time::Duration;

pub const SESSION_COOKIE: &str = "token";

/// Lifetime and transport settings for the session cookie.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl_secs: u64,
    pub insecure_cookie: bool,
}

/// Payload of the encrypted session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub username: String,
    /// Unix seconds.
    pub expires_at: i64,
}

impl SessionClaims {
    pub fn issue(username: impl Into<String>, settings: &SessionSettings) -> Self {
        let ttl = i64::try_from(settings.ttl_secs).unwrap_or(i64::MAX);
        Self {
            username: username.into(),
            expires_at: Utc::now().timestamp().saturating_add(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }
}

pub fn build_session_cookie(
    claims: &SessionClaims,
    settings: &SessionSettings,
) -> Result<Cookie<'static>, serde_json::Error> {
    let value = serde_json::to_string(claims)?;
    let max_age = i64::try_from(settings.ttl_secs).unwrap_or(i64::MAX);
    Ok(Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(!settings.insecure_cookie)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(max_age))
        .build())
}

/// Cookie shape `PrivateCookieJar::remove` needs to expire the session cookie.
pub fn session_removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Extractor that admits requests carrying a valid, unexpired session cookie.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionClaims);

/// Response extension naming the administrator who made the request.
#[derive(Debug, Clone)]
pub struct Operator(pub String);

impl FromRequestParts<WardenState> for RequireSession {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &WardenState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<SessionClaims>() {
            return Ok(RequireSession(claims.clone()));
        }
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let cookie = jar.get(SESSION_COOKIE).ok_or(SessionError::Missing)?;
        let claims: SessionClaims =
            serde_json::from_str(cookie.value()).map_err(|_| SessionError::Malformed)?;
        if claims.is_expired() {
            return Err(SessionError::Expired);
        }
        Ok(RequireSession(claims))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    Missing,
    Malformed,
    Expired,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let reason = match self {
            SessionError::Missing => "Not logged in",
            SessionError::Malformed => "Invalid session",
            SessionError::Expired => "Session expired",
        };
        WardenError::Auth(reason.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: SessionSettings = SessionSettings {
        ttl_secs: 3600,
        insecure_cookie: false,
    };

    #[test]
    fn issued_claims_expire_after_ttl() {
        let claims = SessionClaims::issue("admin", &SETTINGS);
        assert!(!claims.is_expired());
        assert!(claims.expires_at - Utc::now().timestamp() <= 3600);

        let stale = SessionClaims {
            username: "admin".into(),
            expires_at: Utc::now().timestamp() - 1,
        };
        assert!(stale.is_expired());
    }

    #[test]
    fn session_cookie_is_locked_down() {
        let cookie =
            build_session_cookie(&SessionClaims::issue("admin", &SETTINGS), &SETTINGS).unwrap();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));
    }
}
