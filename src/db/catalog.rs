//! Read-only catalog queries.
//!
//! Role and table names are always bound as parameters here; only the row-count query in
//! `table_schema` builds SQL text, and it quotes the table name first.

use super::models::{DbColumnRow, DbGrantRow, DbLoginRole};
use pgwarden_acl_core::{CurrentState, GrantMatrix, Identifier, Privilege, quote_ident};
use pgwarden_schema::roles::{RoleGrants, TablePrivileges};
use pgwarden_schema::schema::{TableColumn, TableSchema};
use pgwarden_schema::users::UserSummary;
use sqlx::PgConnection;
use std::collections::BTreeMap;
use tracing::warn;

const ROLE_GRANTS_SQL: &str = r#"
    SELECT grantee::text AS grantee,
           table_name::text AS table_name,
           privilege_type::text AS privilege_type
    FROM information_schema.role_table_grants
    WHERE grantee = $1 AND table_schema = 'public'
"#;

const ALL_GRANTS_SQL: &str = r#"
    SELECT grantee::text AS grantee,
           table_name::text AS table_name,
           privilege_type::text AS privilege_type
    FROM information_schema.role_table_grants
    WHERE table_schema = 'public' AND grantee::text NOT LIKE 'pg\_%'
"#;

/// Folds grant rows into one matrix per grantee.
///
/// Rows the matrix cannot represent (table names outside the identifier rule, privilege
/// kinds such as `MAINTAIN`) are skipped with a warning.
pub fn fold_grant_rows(rows: Vec<DbGrantRow>) -> BTreeMap<String, GrantMatrix> {
    let mut by_role: BTreeMap<String, GrantMatrix> = BTreeMap::new();
    for row in rows {
        let table = match Identifier::parse(&row.table_name) {
            Ok(table) => table,
            Err(err) => {
                warn!(grantee = %row.grantee, table = %row.table_name, error = %err, "Skipping grant on unmanageable table");
                continue;
            }
        };
        let privilege = match row.privilege_type.parse::<Privilege>() {
            Ok(privilege) => privilege,
            Err(err) => {
                warn!(grantee = %row.grantee, table = %row.table_name, error = %err, "Skipping unsupported privilege kind");
                continue;
            }
        };
        by_role
            .entry(row.grantee)
            .or_default()
            .grant(table, privilege);
    }
    by_role
}

/// Grants `role` currently holds on tables in `public`. Empty when it holds none.
pub async fn current_grants(
    conn: &mut PgConnection,
    role: &Identifier,
) -> Result<CurrentState, sqlx::Error> {
    let rows: Vec<DbGrantRow> = sqlx::query_as(ROLE_GRANTS_SQL)
        .bind(role.as_str())
        .fetch_all(conn)
        .await?;
    Ok(fold_grant_rows(rows)
        .remove(role.as_str())
        .unwrap_or_default())
}

pub async fn role_exists(conn: &mut PgConnection, name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_roles WHERE rolname = $1)")
        .bind(name)
        .fetch_one(conn)
        .await
}

/// Every non-`pg_` role with its table grants in `public`. Roles without grants are
/// listed with an empty table list.
pub async fn list_roles_with_grants(
    conn: &mut PgConnection,
) -> Result<Vec<RoleGrants>, sqlx::Error> {
    let roles: Vec<String> = sqlx::query_scalar(
        r#"SELECT rolname::text FROM pg_catalog.pg_roles
           WHERE rolname NOT LIKE 'pg\_%'
           ORDER BY rolname"#,
    )
    .fetch_all(&mut *conn)
    .await?;
    let rows: Vec<DbGrantRow> = sqlx::query_as(ALL_GRANTS_SQL).fetch_all(&mut *conn).await?;
    Ok(assemble_role_grants(roles, fold_grant_rows(rows)))
}

pub fn assemble_role_grants(
    roles: Vec<String>,
    mut grants: BTreeMap<String, GrantMatrix>,
) -> Vec<RoleGrants> {
    roles
        .into_iter()
        .map(|role| {
            let tables = grants
                .remove(&role)
                .unwrap_or_default()
                .into_iter()
                .map(|(table, privileges)| TablePrivileges {
                    name: table.into_inner(),
                    privileges: privileges.to_names(),
                })
                .collect();
            RoleGrants { role, tables }
        })
        .collect()
}

/// Distinct privilege kinds granted on `public` tables, in canonical order.
pub async fn list_privileges(conn: &mut PgConnection) -> Result<Vec<Privilege>, sqlx::Error> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"SELECT DISTINCT privilege_type::text
           FROM information_schema.role_table_grants
           WHERE table_schema = 'public'"#,
    )
    .fetch_all(conn)
    .await?;
    let mut kinds: Vec<Privilege> = names
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect();
    kinds.sort();
    kinds.dedup();
    Ok(kinds)
}

pub async fn list_tables(conn: &mut PgConnection) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"SELECT table_name::text
           FROM information_schema.tables
           WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
           ORDER BY table_name"#,
    )
    .fetch_all(conn)
    .await
}

/// Friendly name for an `information_schema.columns.data_type` value.
pub fn display_data_type(data_type: &str) -> String {
    let friendly = match data_type {
        "integer" | "smallint" | "bigint" => "Integer",
        "numeric" | "real" | "double precision" => "Decimal",
        "character varying" | "character" | "text" => "Text",
        "boolean" => "Boolean",
        "date" => "Date",
        "timestamp without time zone" | "timestamp with time zone" => "Timestamp",
        "time without time zone" | "time with time zone" => "Time",
        "interval" => "Interval",
        "uuid" => "UUID",
        "json" | "jsonb" => "JSON",
        "bytea" => "Binary",
        "ARRAY" => "Array",
        "USER-DEFINED" => "Enum",
        other => return other.to_string(),
    };
    friendly.to_string()
}

/// Columns and row counts for every base table in `public`.
pub async fn table_schema(conn: &mut PgConnection) -> Result<Vec<TableSchema>, sqlx::Error> {
    let tables = list_tables(&mut *conn).await?;
    let columns: Vec<DbColumnRow> = sqlx::query_as(
        r#"SELECT table_name::text AS table_name,
                  column_name::text AS column_name,
                  data_type::text AS data_type
           FROM information_schema.columns
           WHERE table_schema = 'public'
           ORDER BY table_name, ordinal_position"#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut by_table: BTreeMap<String, Vec<TableColumn>> = BTreeMap::new();
    for column in columns {
        by_table
            .entry(column.table_name)
            .or_default()
            .push(TableColumn {
                column_name: column.column_name,
                data_type: display_data_type(&column.data_type),
            });
    }

    let mut out = Vec::with_capacity(tables.len());
    for name in tables {
        let sql = format!("SELECT count(*) FROM public.{}", quote_ident(&name));
        let row_count: i64 = sqlx::query_scalar(&sql)
            .persistent(false)
            .fetch_one(&mut *conn)
            .await?;
        out.push(TableSchema {
            columns: by_table.remove(&name).unwrap_or_default(),
            name,
            row_count,
        });
    }
    Ok(out)
}

pub async fn list_login_roles(conn: &mut PgConnection) -> Result<Vec<DbLoginRole>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT rolname::text AS username, rolsuper, rolcreatedb, rolreplication,
                  rolbypassrls, rolvaliduntil
           FROM pg_catalog.pg_roles
           WHERE rolcanlogin AND rolname NOT LIKE 'pg\_%'
           ORDER BY rolname"#,
    )
    .fetch_all(conn)
    .await
}

pub fn user_summary(row: DbLoginRole) -> UserSummary {
    UserSummary {
        username: row.username,
        is_superuser: row.rolsuper,
        is_create_db: row.rolcreatedb,
        is_replicable: row.rolreplication,
        bypass_rls: row.rolbypassrls,
        password_expire: row.rolvaliduntil,
    }
}

pub async fn login_role_exists(conn: &mut PgConnection, name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_roles WHERE rolname = $1 AND rolcanlogin)",
    )
    .bind(name)
    .fetch_one(conn)
    .await
}

/// Non-`pg_` roles `username` is a direct member of, by name.
pub async fn memberships(
    conn: &mut PgConnection,
    username: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"SELECT r.rolname::text
           FROM pg_catalog.pg_auth_members m
           JOIN pg_catalog.pg_roles r ON r.oid = m.roleid
           JOIN pg_catalog.pg_roles u ON u.oid = m.member
           WHERE u.rolname = $1 AND r.rolname NOT LIKE 'pg\_%'
           ORDER BY r.rolname"#,
    )
    .bind(username)
    .fetch_all(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgwarden_acl_core::PrivilegeSet;

    fn row(grantee: &str, table: &str, privilege: &str) -> DbGrantRow {
        DbGrantRow {
            grantee: grantee.to_string(),
            table_name: table.to_string(),
            privilege_type: privilege.to_string(),
        }
    }

    #[test]
    fn grant_rows_fold_per_role_and_skip_unsupported() {
        let folded = fold_grant_rows(vec![
            row("clerk", "movies", "SELECT"),
            row("clerk", "movies", "INSERT"),
            row("clerk", "movies", "MAINTAIN"),
            row("clerk", "weird-name", "SELECT"),
            row("auditor", "payments", "SELECT"),
        ]);

        let clerk = &folded["clerk"];
        assert_eq!(clerk.len(), 1);
        assert_eq!(
            clerk.get(&Identifier::parse("movies").unwrap()),
            Some(&PrivilegeSet::from([Privilege::Select, Privilege::Insert]))
        );
        assert_eq!(folded["auditor"].len(), 1);
    }

    #[test]
    fn roles_without_grants_are_listed_empty() {
        let grants = fold_grant_rows(vec![row("clerk", "movies", "SELECT")]);
        let listed = assemble_role_grants(vec!["auditor".into(), "clerk".into()], grants);

        assert_eq!(listed[0].role, "auditor");
        assert!(listed[0].tables.is_empty());
        assert_eq!(listed[1].tables[0].name, "movies");
        assert_eq!(listed[1].tables[0].privileges, vec!["SELECT"]);
    }

    #[test]
    fn data_types_get_friendly_names() {
        assert_eq!(display_data_type("character varying"), "Text");
        assert_eq!(display_data_type("timestamp with time zone"), "Timestamp");
        assert_eq!(display_data_type("integer"), "Integer");
        assert_eq!(display_data_type("tsvector"), "tsvector");
    }
}
