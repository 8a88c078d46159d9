use crate::config::{Config, ConfigError, ConsoleConfig, UsersConfig};
use crate::server::guards::session::{Operator, RequireSession, SessionSettings};
use crate::server::routes::{auth, catalog, console, dashboard, roles, users};
use crate::service::Reconciler;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, FromRequestParts, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use axum_extra::extract::cookie::Key;
use base64::Engine as _;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use pgwarden_acl_core::CommandGuard;
use rand::RngCore;
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const MAX_BODY_BYTES: usize = 64 * 1024;

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Cookie encryption key: SHA-512 of the configured secret gives the 64 bytes the
/// private jar needs.
pub fn session_key(secret: &str) -> Result<Key, ConfigError> {
    if secret.len() < crate::config::MIN_SESSION_SECRET_LEN {
        return Err(ConfigError::WeakSessionSecret);
    }
    let digest = Sha512::digest(secret.as_bytes());
    Key::try_from(digest.as_slice()).map_err(|_| ConfigError::WeakSessionSecret)
}

#[derive(Clone)]
pub struct WardenState {
    pub pool: PgPool,
    pub cookie_key: Key,
    pub session: SessionSettings,
    pub reconciler: Reconciler,
    pub guard: Arc<CommandGuard>,
    pub console: Arc<ConsoleConfig>,
    pub users: Arc<UsersConfig>,
    pub login_limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl WardenState {
    pub fn new(pool: PgPool, cfg: &Config) -> Result<Self, ConfigError> {
        let attempts = NonZeroU32::new(cfg.auth.login_attempts_per_minute)
            .ok_or(ConfigError::ZeroLoginQuota)?;
        Ok(Self {
            pool,
            cookie_key: session_key(&cfg.basic.session_secret)?,
            session: SessionSettings {
                ttl_secs: cfg.basic.session_ttl_secs,
                insecure_cookie: cfg.basic.insecure_cookie,
            },
            reconciler: Reconciler::new(cfg.default_privileges()?),
            guard: Arc::new(CommandGuard::new(&cfg.console.sensitive_tables)),
            console: Arc::new(cfg.console.clone()),
            users: Arc::new(cfg.users.clone()),
            login_limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(attempts))),
        })
    }
}

impl FromRef<WardenState> for Key {
    fn from_ref(state: &WardenState) -> Self {
        state.cookie_key.clone()
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Admits requests with a valid session and records who made them, so the access log
/// can name the operator.
async fn require_session(State(state): State<WardenState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    match RequireSession::from_request_parts(&mut parts, &state).await {
        Ok(RequireSession(claims)) => {
            let operator = Operator(claims.username.clone());
            parts.extensions.insert(claims);
            let mut resp = next.run(Request::from_parts(parts, body)).await;
            resp.extensions_mut().insert(operator);
            resp
        }
        Err(rejection) => rejection.into_response(),
    }
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(generate_request_id, str::to_string);

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status().as_u16();
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let operator = resp
        .extensions()
        .get::<Operator>()
        .map_or("-", |op| op.0.as_str());

    if resp.status().is_server_error() {
        error!(%request_id, status, %method, %path, ?version, latency_ms, operator, "request failed");
    } else if resp.status().is_client_error() {
        warn!(%request_id, status, %method, %path, ?version, latency_ms, operator, "request rejected");
    } else {
        info!(%request_id, status, %method, %path, ?version, latency_ms, operator, "request served");
    }

    resp
}

pub fn warden_router(state: WardenState) -> Router {
    let public = Router::new()
        .route("/auth", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected = Router::new()
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route("/roles/{role}", delete(roles::drop_role))
        .route("/roles/{role}/table", patch(roles::update_role_tables))
        .route("/roles/{role}/privileges", patch(roles::update_role_privileges))
        .route("/privileges", get(catalog::list_privileges))
        .route("/tables", get(catalog::list_tables))
        .route("/schema", get(catalog::table_schema))
        .route("/console", post(console::run_command))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{username}",
            get(users::user_role)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(access_log))
}
