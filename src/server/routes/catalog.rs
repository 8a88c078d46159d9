use crate::db::catalog;
use crate::error::WardenError;
use crate::server::router::WardenState;
use axum::{Json, extract::State};
use pgwarden_schema::{PrivilegeInfo, TableSchema};

/// GET /privileges
pub async fn list_privileges(
    State(state): State<WardenState>,
) -> Result<Json<Vec<PrivilegeInfo>>, WardenError> {
    let mut conn = state.pool.acquire().await?;
    let kinds = catalog::list_privileges(&mut conn).await?;
    Ok(Json(
        kinds
            .into_iter()
            .map(|p| PrivilegeInfo {
                name: p.as_sql().to_string(),
                description: p.description().to_string(),
            })
            .collect(),
    ))
}

/// GET /tables
pub async fn list_tables(
    State(state): State<WardenState>,
) -> Result<Json<Vec<String>>, WardenError> {
    let mut conn = state.pool.acquire().await?;
    Ok(Json(catalog::list_tables(&mut conn).await?))
}

/// GET /schema
pub async fn table_schema(
    State(state): State<WardenState>,
) -> Result<Json<Vec<TableSchema>>, WardenError> {
    let mut conn = state.pool.acquire().await?;
    Ok(Json(catalog::table_schema(&mut conn).await?))
}
