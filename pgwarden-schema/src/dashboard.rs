use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub num_of_users: i64,
    pub num_of_roles: i64,
    pub num_of_tables: i64,
    pub num_of_views: i64,
    pub num_of_indexes: i64,
    pub num_of_triggers: i64,
    /// Bytes, as reported by `pg_database_size(current_database())`.
    pub database_size: i64,
    pub recent_activities: Vec<RecentActivity>,
}

/// One backend from `pg_stat_activity`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RecentActivity {
    pub usename: Option<String>,
    pub ip: Option<String>,
    pub status: Option<String>,
    pub backend_start: Option<DateTime<Utc>>,
}
