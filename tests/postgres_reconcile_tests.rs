//! Runs against a live PostgreSQL when `PGWARDEN_TEST_DATABASE_URL` is set (a superuser
//! connection to a scratch database). Skipped otherwise.

use pgwarden::WardenError;
use pgwarden::config::{Config, ConsoleConfig};
use pgwarden::db::{catalog, console};
use pgwarden::service::Reconciler;
use pgwarden_acl_core::{GrantMatrix, Identifier, Privilege, PrivilegeSet};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const TEST_DATABASE_URL: &str = "PGWARDEN_TEST_DATABASE_URL";

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var(TEST_DATABASE_URL)
        .ok()
        .filter(|url| !url.is_empty())?;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("failed to connect to test database");
    Some(pool)
}

/// Unique lowercase names so tests can share one database.
struct Fixture {
    suffix: u32,
}

impl Fixture {
    fn new() -> Self {
        Self {
            suffix: rand::random::<u32>(),
        }
    }

    fn name(&self, base: &str) -> Identifier {
        Identifier::parse(&format!("pgw_{base}_{}", self.suffix)).expect("fixture name")
    }

    async fn create_tables(&self, pool: &PgPool, bases: &[&str]) {
        for base in bases {
            let sql = format!("CREATE TABLE public.{} (id int)", self.name(base));
            sqlx::raw_sql(&sql)
                .execute(pool)
                .await
                .expect("create fixture table");
        }
    }

    async fn cleanup(&self, pool: &PgPool, role_bases: &[&str], table_bases: &[&str]) {
        for base in role_bases {
            let role = self.name(base);
            let sql = format!(
                "DO $$ BEGIN IF EXISTS (SELECT 1 FROM pg_roles WHERE rolname = '{raw}') THEN \
                 EXECUTE 'DROP OWNED BY {role}'; EXECUTE 'DROP ROLE {role}'; END IF; END $$",
                raw = role.as_str(),
            );
            let _ = sqlx::raw_sql(&sql).execute(pool).await;
        }
        for base in table_bases {
            let sql = format!("DROP TABLE IF EXISTS public.{}", self.name(base));
            let _ = sqlx::raw_sql(&sql).execute(pool).await;
        }
    }
}

fn reconciler() -> Reconciler {
    let cfg = Config::default();
    Reconciler::new(cfg.default_privileges().expect("default privileges"))
}

fn set(privileges: &[Privilege]) -> PrivilegeSet {
    privileges.iter().copied().collect()
}

#[tokio::test]
async fn created_role_reads_back_exactly() {
    let Some(pool) = test_pool().await else {
        eprintln!("{TEST_DATABASE_URL} not set; skipping");
        return;
    };
    let fx = Fixture::new();
    fx.create_tables(&pool, &["movies", "orders"]).await;
    let role = fx.name("clerk");

    let desired: GrantMatrix = [
        (fx.name("movies"), set(&[Privilege::Select])),
        (fx.name("orders"), set(&[Privilege::Select, Privilege::Insert])),
    ]
    .into_iter()
    .collect();

    let outcome = reconciler()
        .create_role(&pool, &role, desired.clone())
        .await
        .expect("create role");
    assert_eq!(outcome.statements, 2);

    let mut conn = pool.acquire().await.expect("acquire");
    let current = catalog::current_grants(&mut conn, &role)
        .await
        .expect("read grants");
    assert_eq!(current, desired);

    let listed = catalog::list_roles_with_grants(&mut conn)
        .await
        .expect("list roles");
    let entry = listed
        .iter()
        .find(|r| r.role == role.as_str())
        .expect("new role is listed");
    assert_eq!(entry.tables.len(), 2);
    drop(conn);

    let again = reconciler()
        .create_role(&pool, &role, desired)
        .await
        .expect_err("duplicate role");
    assert!(matches!(again, WardenError::Validation(_)));

    fx.cleanup(&pool, &["clerk"], &["movies", "orders"]).await;
}

#[tokio::test]
async fn membership_and_privilege_edits_converge() {
    let Some(pool) = test_pool().await else {
        eprintln!("{TEST_DATABASE_URL} not set; skipping");
        return;
    };
    let fx = Fixture::new();
    fx.create_tables(&pool, &["movies", "orders", "invoices"])
        .await;
    let role = fx.name("analyst");
    let svc = reconciler();

    let initial: GrantMatrix = [
        (fx.name("movies"), set(&[Privilege::Select])),
        (fx.name("orders"), set(&[Privilege::Select, Privilege::Insert])),
    ]
    .into_iter()
    .collect();
    svc.create_role(&pool, &role, initial)
        .await
        .expect("create role");

    let outcome = svc
        .set_tables(&pool, &role, vec![fx.name("orders"), fx.name("invoices")])
        .await
        .expect("membership edit");
    assert_eq!(outcome.plan.tables_to_revoke_all, vec![fx.name("movies")]);
    assert_eq!(outcome.statements, 2);

    let mut conn = pool.acquire().await.expect("acquire");
    let current = catalog::current_grants(&mut conn, &role)
        .await
        .expect("read grants");
    assert!(!current.contains_table(&fx.name("movies")));
    assert_eq!(
        current.get(&fx.name("orders")),
        Some(&set(&[Privilege::Select, Privilege::Insert]))
    );
    assert_eq!(
        current.get(&fx.name("invoices")),
        Some(&set(&[Privilege::Select]))
    );
    drop(conn);

    let outcome = svc
        .set_table_privileges(
            &pool,
            &role,
            fx.name("orders"),
            set(&[Privilege::Select, Privilege::Update]),
        )
        .await
        .expect("privilege edit");
    assert_eq!(outcome.statements, 2);

    let repeat = svc
        .set_table_privileges(
            &pool,
            &role,
            fx.name("orders"),
            set(&[Privilege::Select, Privilege::Update]),
        )
        .await
        .expect("repeat edit");
    assert!(repeat.plan.is_empty());
    assert_eq!(repeat.statements, 0);

    let missing = svc
        .set_tables(&pool, &fx.name("ghost"), vec![])
        .await
        .expect_err("unknown role");
    assert!(matches!(missing, WardenError::NotFound { .. }));

    fx.cleanup(&pool, &["analyst"], &["movies", "orders", "invoices"])
        .await;
}

#[tokio::test]
async fn failed_statement_rolls_back_the_whole_plan() {
    let Some(pool) = test_pool().await else {
        eprintln!("{TEST_DATABASE_URL} not set; skipping");
        return;
    };
    let fx = Fixture::new();
    fx.create_tables(&pool, &["movies"]).await;
    let role = fx.name("auditor");
    let svc = reconciler();

    // The second table does not exist, so its GRANT fails after the first succeeded.
    let desired: GrantMatrix = [
        (fx.name("movies"), set(&[Privilege::Select])),
        (fx.name("zz_missing"), set(&[Privilege::Select])),
    ]
    .into_iter()
    .collect();
    let err = svc
        .create_role(&pool, &role, desired)
        .await
        .expect_err("grant on missing table");
    match err {
        WardenError::Reconciliation { statement, .. } => {
            assert!(statement.contains("zz_missing"), "{statement}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let mut conn = pool.acquire().await.expect("acquire");
    assert!(
        !catalog::role_exists(&mut conn, role.as_str())
            .await
            .expect("role lookup"),
        "CREATE ROLE must be rolled back with the grants"
    );
    drop(conn);

    fx.cleanup(&pool, &["auditor"], &["movies"]).await;
}

#[tokio::test]
async fn drop_role_with_dependencies_fails_and_role_remains() {
    let Some(pool) = test_pool().await else {
        eprintln!("{TEST_DATABASE_URL} not set; skipping");
        return;
    };
    let fx = Fixture::new();
    fx.create_tables(&pool, &["movies"]).await;
    let role = fx.name("owner");
    let svc = reconciler();

    let desired: GrantMatrix = [(fx.name("movies"), set(&[Privilege::Select]))]
        .into_iter()
        .collect();
    svc.create_role(&pool, &role, desired)
        .await
        .expect("create role");

    let err = svc
        .drop_role(&pool, &role)
        .await
        .expect_err("grants block DROP ROLE");
    assert!(matches!(err, WardenError::Reconciliation { .. }));

    let mut conn = pool.acquire().await.expect("acquire");
    assert!(
        catalog::role_exists(&mut conn, role.as_str())
            .await
            .expect("role lookup")
    );
    drop(conn);

    let missing = svc
        .drop_role(&pool, &fx.name("ghost"))
        .await
        .expect_err("unknown role");
    assert!(matches!(missing, WardenError::NotFound { .. }));

    fx.cleanup(&pool, &["owner"], &["movies"]).await;
}

#[tokio::test]
async fn console_runs_read_only_and_caps_rows() {
    let Some(pool) = test_pool().await else {
        eprintln!("{TEST_DATABASE_URL} not set; skipping");
        return;
    };
    let settings = ConsoleConfig {
        max_rows: 2,
        ..ConsoleConfig::default()
    };

    let resp = console::execute(&pool, "select 1 as one, 'x' as label", &settings)
        .await
        .expect("select");
    assert_eq!(resp.row_count, 1);
    assert_eq!(resp.rows[0]["one"], 1);
    assert_eq!(resp.rows[0]["label"], "x");

    let resp = console::execute(&pool, "select generate_series(1, 5) as n", &settings)
        .await
        .expect("series");
    assert_eq!(resp.row_count, 2);
    assert!(resp.truncated);

    let resp = console::execute(&pool, "select 1 where false", &settings)
        .await
        .expect("empty");
    assert_eq!(resp.message.as_deref(), Some("No results found"));

    let fx = Fixture::new();
    let seq = fx.name("seq");
    sqlx::raw_sql(&format!("CREATE SEQUENCE public.{seq}"))
        .execute(&pool)
        .await
        .expect("create sequence");
    let write = console::execute(&pool, &format!("select nextval('public.{seq}')"), &settings).await;
    assert!(write.is_err(), "nextval must fail in a read-only transaction");
    let _ = sqlx::raw_sql(&format!("DROP SEQUENCE public.{seq}"))
        .execute(&pool)
        .await;
}

#[tokio::test]
async fn console_renders_exact_and_extended_types() {
    let Some(pool) = test_pool().await else {
        eprintln!("{TEST_DATABASE_URL} not set; skipping");
        return;
    };
    let settings = ConsoleConfig::default();

    let resp = console::execute(
        &pool,
        "select 12.50::numeric as price, \
                '6f1c2b9e-1c1a-4c2e-9a6b-0f5a1e2d3c4b'::uuid as id, \
                avg(x) as mean, \
                '192.168.0.1/32'::inet as addr, \
                interval '1 day 02:00:00' as wait, \
                '\\xdead'::bytea as raw, \
                array[1.5, 2]::numeric[] as nums \
         from (values (1), (2)) v(x)",
        &settings,
    )
    .await
    .expect("typed select");
    let row = &resp.rows[0];
    let number = |v: &serde_json::Value| v.as_str().and_then(|s| s.parse::<f64>().ok());
    assert_eq!(number(&row["price"]), Some(12.5));
    assert_eq!(row["id"], "6f1c2b9e-1c1a-4c2e-9a6b-0f5a1e2d3c4b");
    assert_eq!(number(&row["mean"]), Some(1.5));
    assert_eq!(row["addr"], "192.168.0.1/32");
    assert_eq!(row["wait"], "1 day 02:00:00");
    assert_eq!(row["raw"], "\\xdead");
    let nums: Vec<Option<f64>> = row["nums"]
        .as_array()
        .expect("numeric array")
        .iter()
        .map(number)
        .collect();
    assert_eq!(nums, vec![Some(1.5), Some(2.0)]);
}
