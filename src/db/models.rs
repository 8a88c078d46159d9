use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of `information_schema.role_table_grants`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct DbGrantRow {
    pub grantee: String,
    pub table_name: String,
    pub privilege_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct DbColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbLoginRole {
    pub username: String,
    pub rolsuper: bool,
    pub rolcreatedb: bool,
    pub rolreplication: bool,
    pub rolbypassrls: bool,
    pub rolvaliduntil: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct DbRoleCapabilities {
    pub rolname: String,
    pub rolsuper: bool,
    pub rolcreaterole: bool,
    pub rolcanlogin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct DbDashboardCounts {
    pub num_of_users: i64,
    pub num_of_roles: i64,
    pub num_of_tables: i64,
    pub num_of_views: i64,
    pub num_of_indexes: i64,
    pub num_of_triggers: i64,
    pub database_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbActivityRow {
    pub usename: Option<String>,
    pub ip: Option<String>,
    pub status: Option<String>,
    pub backend_start: Option<DateTime<Utc>>,
}
