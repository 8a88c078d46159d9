use crate::db::models::DbRoleCapabilities;
use crate::error::WardenError;
use sqlx::{Connection, PgConnection, PgPool};
use tracing::debug;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// SQLSTATE class 28: invalid authorization specification.
fn is_auth_failure(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().is_some_and(|code| code.starts_with("28")))
}

/// Checks credentials by connecting as `username` with the pool's host and database.
///
/// Succeeds only for roles that may administer other roles (`rolsuper` or
/// `rolcreaterole`). The probe connection is closed before returning.
pub async fn verify_administrator(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<(), WardenError> {
    let options = pool
        .connect_options()
        .as_ref()
        .clone()
        .username(username)
        .password(password);

    let mut conn = match PgConnection::connect_with(&options).await {
        Ok(conn) => conn,
        Err(err) if is_auth_failure(&err) => {
            return Err(WardenError::Auth(INVALID_CREDENTIALS.to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    let capabilities: Option<DbRoleCapabilities> = sqlx::query_as(
        r#"SELECT rolname::text AS rolname, rolsuper, rolcreaterole, rolcanlogin
           FROM pg_catalog.pg_roles
           WHERE rolname = current_user"#,
    )
    .fetch_optional(&mut conn)
    .await?;

    if let Err(err) = conn.close().await {
        debug!(error = %err, "Closing login probe connection failed");
    }

    match capabilities {
        Some(caps) if caps.rolsuper || caps.rolcreaterole => Ok(()),
        Some(_) => Err(WardenError::Auth(format!(
            "`{username}` is not allowed to manage roles"
        ))),
        None => Err(WardenError::Auth(INVALID_CREDENTIALS.to_string())),
    }
}
