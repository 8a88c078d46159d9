use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use pgwarden_acl_core::{GuardRejection, IdentifierError, PrivilegeParseError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::{error, warn};

#[derive(Debug, ThisError)]
pub enum WardenError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Too many login attempts for `{0}`")]
    RateLimited(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Invalid privilege: {0}")]
    Privilege(#[from] PrivilegeParseError),

    #[error("Console command rejected: {0}")]
    CommandRejected(GuardRejection),

    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),

    /// A role/privilege mutation failed; the enclosing transaction was rolled back.
    #[error("Statement `{statement}` failed: {source}")]
    Reconciliation {
        statement: String,
        #[source]
        source: sqlx::Error,
    },
}

impl WardenError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        WardenError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        WardenError::Validation(message.into())
    }
}

impl From<JsonRejection> for WardenError {
    fn from(rejection: JsonRejection) -> Self {
        WardenError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for WardenError {
    fn from(rejection: PathRejection) -> Self {
        WardenError::Validation(rejection.body_text())
    }
}

/// Message reported by PostgreSQL, without the driver's wrapping.
fn database_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

fn database_details(err: &sqlx::Error) -> Option<Value> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    let mut details = serde_json::Map::new();
    if let Some(code) = db.code() {
        details.insert("sqlstate".to_string(), Value::String(code.into_owned()));
    }
    if let Some(pg) = db.try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
        && let Some(detail) = pg.detail()
    {
        details.insert("detail".to_string(), Value::String(detail.to_string()));
    }
    (!details.is_empty()).then_some(Value::Object(details))
}

impl IntoResponse for WardenError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            WardenError::Auth(message) => {
                warn!(reason = %message, "Authentication rejected");
                (
                    StatusCode::UNAUTHORIZED,
                    ApiErrorObject {
                        code: "UNAUTHORIZED".to_string(),
                        message,
                        details: None,
                    },
                )
            }

            WardenError::RateLimited(username) => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorObject {
                    code: "RATE_LIMITED".to_string(),
                    message: format!("Too many login attempts for `{username}`; retry later."),
                    details: None,
                },
            ),

            WardenError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "VALIDATION_ERROR".to_string(),
                    message,
                    details: None,
                },
            ),

            WardenError::Identifier(err) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_IDENTIFIER".to_string(),
                    message: err.to_string(),
                    details: None,
                },
            ),

            WardenError::Privilege(err) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_PRIVILEGE".to_string(),
                    message: err.to_string(),
                    details: None,
                },
            ),

            WardenError::CommandRejected(rejection) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "COMMAND_REJECTED".to_string(),
                    message: rejection.to_string(),
                    details: serde_json::to_value(&rejection).ok(),
                },
            ),

            WardenError::NotFound { kind, name } => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{kind} `{name}` not found"),
                    details: None,
                },
            ),

            // The tool is operated by trusted administrators, so the database's own
            // message is passed through.
            WardenError::Query(err) => {
                error!(error = %err, "Query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "QUERY_ERROR".to_string(),
                        message: database_message(&err),
                        details: database_details(&err),
                    },
                )
            }

            WardenError::Reconciliation { statement, source } => {
                error!(%statement, error = %source, "Reconciliation rolled back");
                let mut details = database_details(&source)
                    .and_then(|v| match v {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .unwrap_or_default();
                details.insert("statement".to_string(), Value::String(statement));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "RECONCILIATION_ERROR".to_string(),
                        message: database_message(&source),
                        details: Some(Value::Object(details)),
                    },
                )
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
