//! PostgreSQL access.
//!
//! Layout:
//! - `models.rs`: row structs for catalog queries
//! - `catalog.rs`: read-only catalog queries (grants, roles, tables, schema, users)
//! - `executor.rs`: the only code that issues GRANT/REVOKE and role DDL
//! - `console.rs`: verbatim execution of console commands
//! - `stats.rs`: dashboard aggregates
//!
//! Every function takes `&mut PgConnection` so callers decide whether it runs on a
//! plain pooled connection or inside a transaction.

pub mod catalog;
pub mod console;
pub mod executor;
pub mod models;
pub mod stats;

use crate::config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

fn pool_options(cfg: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .acquire_timeout(Duration::from_secs(cfg.database.acquire_timeout_secs))
}

/// Opens the pool and verifies one connection. Closed by the caller on shutdown.
pub async fn connect(cfg: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(cfg)
        .connect(&cfg.basic.database_url)
        .await?;
    info!(
        database_url = %cfg.redacted_database_url(),
        max_connections = cfg.database.max_connections,
        "Database pool initialized"
    );
    Ok(pool)
}

/// Builds a pool that connects on first use.
pub fn connect_lazy(cfg: &Config) -> Result<PgPool, sqlx::Error> {
    pool_options(cfg).connect_lazy(&cfg.basic.database_url)
}
