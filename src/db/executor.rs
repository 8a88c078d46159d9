//! Issues GRANT/REVOKE and role DDL.
//!
//! Callers own the transaction. A failing statement is reported as
//! `WardenError::Reconciliation` naming the statement; the caller rolls back.

use crate::error::WardenError;
use pgwarden_acl_core::{GrantStatement, Identifier, ReconciliationPlan, RoleStatement};
use sqlx::{Executor as _, PgConnection};
use tracing::{debug, info};

/// Runs one statement through the simple query protocol, so DDL never lands in the
/// prepared statement cache.
async fn run(conn: &mut PgConnection, sql: &str, shown: String) -> Result<(), WardenError> {
    debug!(statement = %shown, "Executing");
    conn.execute(sqlx::raw_sql(sql))
        .await
        .map(|_| ())
        .map_err(|source| WardenError::Reconciliation {
            statement: shown,
            source,
        })
}

pub async fn execute_grant(
    conn: &mut PgConnection,
    statement: &GrantStatement,
) -> Result<(), WardenError> {
    let sql = statement.to_sql();
    run(conn, &sql, sql.clone()).await
}

/// Executes `plan` for `role` in plan order. Returns the number of statements run.
pub async fn execute_plan(
    conn: &mut PgConnection,
    role: &Identifier,
    plan: &ReconciliationPlan,
) -> Result<usize, WardenError> {
    let statements = plan.statements(role);
    for statement in &statements {
        execute_grant(&mut *conn, statement).await?;
    }
    if !statements.is_empty() {
        info!(role = %role.as_str(), statements = statements.len(), "Privilege plan applied");
    }
    Ok(statements.len())
}

/// Executes role DDL. Password literals never reach logs or error reports.
pub async fn execute_role(
    conn: &mut PgConnection,
    statement: &RoleStatement,
) -> Result<(), WardenError> {
    run(conn, &statement.to_string(), statement.redacted()).await
}
