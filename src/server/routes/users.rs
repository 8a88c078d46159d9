use crate::db::catalog;
use crate::error::WardenError;
use crate::server::guards::session::RequireSession;
use crate::server::router::WardenState;
use crate::service::UserChanges;
use crate::service::users::{self, ensure_password, ensure_unprotected};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use pgwarden_acl_core::Identifier;
use pgwarden_schema::{
    CreateUserRequest, MessageResponse, UpdateUserRequest, UserRoleResponse, UserSummary,
};
use tracing::info;

/// Empty strings in partial updates mean "leave unchanged".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /users
///
/// Protected users are not listed.
pub async fn list_users(
    State(state): State<WardenState>,
) -> Result<Json<Vec<UserSummary>>, WardenError> {
    let mut conn = state.pool.acquire().await?;
    let rows = catalog::list_login_roles(&mut conn).await?;
    Ok(Json(
        rows.into_iter()
            .filter(|row| !state.users.is_protected(&row.username))
            .map(catalog::user_summary)
            .collect(),
    ))
}

/// POST /users
pub async fn create_user(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), WardenError> {
    let Json(req) = payload?;
    let username = Identifier::parse_new_role(&req.username)?;
    ensure_unprotected(&state.users, username.as_str())?;
    ensure_password(&req.password)?;
    let role = non_empty(req.role)
        .map(|r| Identifier::parse(&r))
        .transpose()?;

    info!(operator = %session.username, user = %username.as_str(), "Creating user");
    users::create_user(&state.pool, &username, &req.password, role.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "User {} created successfully",
            username.as_str()
        ))),
    ))
}

/// GET /users/{username}
pub async fn user_role(
    State(state): State<WardenState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<UserRoleResponse>, WardenError> {
    let Path(username) = path?;
    let username = Identifier::parse(&username)?;
    let role = users::user_role(&state.pool, &username).await?;
    Ok(Json(UserRoleResponse { role }))
}

/// PATCH /users/{username}
pub async fn update_user(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, WardenError> {
    let Path(username) = path?;
    let Json(req) = payload?;
    let username = Identifier::parse(&username)?;
    ensure_unprotected(&state.users, username.as_str())?;

    let rename_to = non_empty(req.username)
        .map(|name| Identifier::parse_new_role(&name))
        .transpose()?;
    if let Some(to) = &rename_to {
        ensure_unprotected(&state.users, to.as_str())?;
    }
    let changes = UserChanges {
        password: non_empty(req.password),
        rename_to,
        role: non_empty(req.role)
            .map(|r| Identifier::parse(&r))
            .transpose()?,
    };

    info!(operator = %session.username, user = %username.as_str(), "Updating user");
    let final_name = users::update_user(&state.pool, &username, changes).await?;
    Ok(Json(MessageResponse::new(format!(
        "User {} updated successfully",
        final_name.as_str()
    ))))
}

/// DELETE /users/{username}
pub async fn delete_user(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, WardenError> {
    let Path(username) = path?;
    let username = Identifier::parse(&username)?;
    ensure_unprotected(&state.users, username.as_str())?;

    info!(operator = %session.username, user = %username.as_str(), "Dropping user");
    users::delete_user(&state.pool, &username).await?;
    Ok(Json(MessageResponse::new(format!(
        "User {} deleted successfully",
        username.as_str()
    ))))
}
