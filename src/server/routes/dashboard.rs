use crate::db::stats;
use crate::error::WardenError;
use crate::server::router::WardenState;
use axum::{Json, extract::State};
use pgwarden_schema::DashboardData;

/// GET /dashboard
pub async fn dashboard(
    State(state): State<WardenState>,
) -> Result<Json<DashboardData>, WardenError> {
    let mut conn = state.pool.acquire().await?;
    Ok(Json(stats::dashboard(&mut conn).await?))
}
