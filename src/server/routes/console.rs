use crate::db::console;
use crate::error::WardenError;
use crate::server::guards::session::RequireSession;
use crate::server::router::WardenState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use pgwarden_schema::{ConsoleRequest, ConsoleResponse};
use tracing::{info, warn};

/// POST /console
///
/// The guard runs before any connection is taken from the pool.
pub async fn run_command(
    State(state): State<WardenState>,
    RequireSession(session): RequireSession,
    payload: Result<Json<ConsoleRequest>, JsonRejection>,
) -> Result<Json<ConsoleResponse>, WardenError> {
    let Json(req) = payload?;

    if let Err(rejection) = state.guard.check(&req.command) {
        warn!(operator = %session.username, %rejection, "Console command rejected");
        return Err(WardenError::CommandRejected(rejection));
    }

    info!(operator = %session.username, command = %req.command, "Running console command");
    let response = console::execute(&state.pool, &req.command, &state.console).await?;
    Ok(Json(response))
}
