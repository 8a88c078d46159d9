use crate::db::catalog;
use crate::error::WardenError;
use crate::server::guards::session::RequireSession;
use crate::server::router::WardenState;
use crate::service::{desired_from_entries, users::ensure_unprotected};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use pgwarden_acl_core::{Identifier, PrivilegeSet};
use pgwarden_schema::{
    CreateRoleRequest, MessageResponse, RoleGrants, UpdateRolePrivilegesRequest,
    UpdateRoleTablesRequest,
};
use tracing::info;

/// GET /roles
pub async fn list_roles(
    State(state): State<WardenState>,
) -> Result<Json<Vec<RoleGrants>>, WardenError> {
    let mut conn = state.pool.acquire().await?;
    Ok(Json(catalog::list_roles_with_grants(&mut conn).await?))
}

/// POST /roles
pub async fn create_role(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), WardenError> {
    let Json(req) = payload?;
    let role = Identifier::parse_new_role(&req.role)?;
    let desired = desired_from_entries(
        &req.table_and_privileges,
        state.reconciler.default_privileges(),
    )?;

    info!(operator = %session.username, role = %role.as_str(), tables = desired.len(), "Creating role");
    state
        .reconciler
        .create_role(&state.pool, &role, desired)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Role {} created successfully",
            role.as_str()
        ))),
    ))
}

/// PATCH /roles/{role}/table
pub async fn update_role_tables(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateRoleTablesRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, WardenError> {
    let Path(role) = path?;
    let Json(req) = payload?;
    let role = Identifier::parse(&role)?;
    let tables = req
        .updated_tables
        .iter()
        .map(|t| Identifier::parse(t))
        .collect::<Result<Vec<_>, _>>()?;

    info!(operator = %session.username, role = %role.as_str(), tables = tables.len(), "Updating role tables");
    let outcome = state.reconciler.set_tables(&state.pool, &role, tables).await?;
    Ok(Json(MessageResponse::new(format!(
        "Tables updated for role {} ({} statements)",
        role.as_str(),
        outcome.statements
    ))))
}

/// PATCH /roles/{role}/privileges
pub async fn update_role_privileges(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateRolePrivilegesRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, WardenError> {
    let Path(role) = path?;
    let Json(req) = payload?;
    let role = Identifier::parse(&role)?;
    let table = Identifier::parse(&req.table)?;
    let privileges = PrivilegeSet::parse_names(&req.updated_privileges)?;

    info!(
        operator = %session.username,
        role = %role.as_str(),
        table = %table.as_str(),
        privileges = %privileges,
        "Updating table privileges"
    );
    let outcome = state
        .reconciler
        .set_table_privileges(&state.pool, &role, table, privileges)
        .await?;
    Ok(Json(MessageResponse::new(format!(
        "Privileges updated for role {} ({} statements)",
        role.as_str(),
        outcome.statements
    ))))
}

/// DELETE /roles/{role}
pub async fn drop_role(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, WardenError> {
    let Path(role) = path?;
    let role = Identifier::parse(&role)?;
    ensure_unprotected(&state.users, role.as_str())?;

    info!(operator = %session.username, role = %role.as_str(), "Dropping role");
    state.reconciler.drop_role(&state.pool, &role).await?;
    Ok(Json(MessageResponse::new(format!(
        "Role {} deleted successfully",
        role.as_str()
    ))))
}
