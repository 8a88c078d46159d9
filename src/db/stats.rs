use super::models::{DbActivityRow, DbDashboardCounts};
use pgwarden_schema::{DashboardData, RecentActivity};
use sqlx::PgConnection;

const COUNTS_SQL: &str = r#"
    SELECT
        (SELECT count(*) FROM pg_catalog.pg_roles
          WHERE rolcanlogin AND rolname NOT LIKE 'pg\_%') AS num_of_users,
        (SELECT count(*) FROM pg_catalog.pg_roles
          WHERE NOT rolcanlogin AND rolname NOT LIKE 'pg\_%') AS num_of_roles,
        (SELECT count(*) FROM pg_catalog.pg_tables WHERE schemaname = 'public') AS num_of_tables,
        (SELECT count(*) FROM pg_catalog.pg_views WHERE schemaname = 'public') AS num_of_views,
        (SELECT count(*) FROM pg_catalog.pg_indexes WHERE schemaname = 'public') AS num_of_indexes,
        (SELECT count(*)
           FROM pg_catalog.pg_trigger t
           JOIN pg_catalog.pg_class c ON c.oid = t.tgrelid
           JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
          WHERE NOT t.tgisinternal AND n.nspname = 'public') AS num_of_triggers,
        pg_database_size(current_database()) AS database_size
"#;

const RECENT_ACTIVITY_SQL: &str = r#"
    SELECT usename::text AS usename,
           client_addr::text AS ip,
           state AS status,
           backend_start
    FROM pg_catalog.pg_stat_activity
    WHERE backend_type = 'client backend'
    ORDER BY backend_start DESC NULLS LAST
    LIMIT 10
"#;

pub async fn dashboard(conn: &mut PgConnection) -> Result<DashboardData, sqlx::Error> {
    let counts: DbDashboardCounts = sqlx::query_as(COUNTS_SQL).fetch_one(&mut *conn).await?;
    let activity: Vec<DbActivityRow> = sqlx::query_as(RECENT_ACTIVITY_SQL)
        .fetch_all(&mut *conn)
        .await?;

    Ok(DashboardData {
        num_of_users: counts.num_of_users,
        num_of_roles: counts.num_of_roles,
        num_of_tables: counts.num_of_tables,
        num_of_views: counts.num_of_views,
        num_of_indexes: counts.num_of_indexes,
        num_of_triggers: counts.num_of_triggers,
        database_size: counts.database_size,
        recent_activities: activity
            .into_iter()
            .map(|row| RecentActivity {
                usename: row.usename,
                ip: row.ip,
                status: row.status,
                backend_start: row.backend_start,
            })
            .collect(),
    })
}
