use crate::db::{catalog, executor};
use crate::error::WardenError;
use crate::utils::logging::with_pretty_json_debug;
use pgwarden_acl_core::{
    CurrentState, DesiredState, GrantMatrix, Identifier, PrivilegeSet, ReconciliationPlan,
    RoleStatement, diff,
};
use pgwarden_schema::TablePrivileges;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};

/// Result of one reconciliation: the plan that ran and how many statements it took.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub plan: ReconciliationPlan,
    pub statements: usize,
}

/// Commits on success, rolls back on failure. The original error wins over a rollback error.
pub(crate) async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, WardenError>,
) -> Result<T, WardenError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Turns request entries into a desired state. Entries without privileges get `default`;
/// a table listed twice gets the union of both lists.
pub fn desired_from_entries(
    entries: &[TablePrivileges],
    default: &PrivilegeSet,
) -> Result<DesiredState, WardenError> {
    let mut desired = GrantMatrix::new();
    for entry in entries {
        let table = Identifier::parse(&entry.name)?;
        let mut privileges = PrivilegeSet::parse_names(&entry.privileges)?;
        if privileges.is_empty() {
            privileges = default.clone();
        }
        let merged = match desired.get(&table) {
            Some(existing) => existing.union(&privileges),
            None => privileges,
        };
        desired.set(table, merged);
    }
    Ok(desired)
}

/// How a role's desired grants are derived from what it holds now.
#[derive(Debug, Clone)]
pub enum GrantEdit {
    /// The matrix becomes the role's complete grant set.
    Replace(DesiredState),
    /// Membership-only edit: these tables become the role's table list. Kept tables keep
    /// their privileges, new ones get the defaults.
    Tables(Vec<Identifier>),
    /// Single-table edit; an empty set removes the table from the role.
    TablePrivileges {
        table: Identifier,
        privileges: PrivilegeSet,
    },
}

impl GrantEdit {
    pub fn desired(self, current: &CurrentState, default: &PrivilegeSet) -> DesiredState {
        match self {
            GrantEdit::Replace(desired) => desired,
            GrantEdit::Tables(tables) => GrantMatrix::with_table_membership(current, tables, default),
            GrantEdit::TablePrivileges { table, privileges } => {
                GrantMatrix::with_table_privileges(current, table, privileges)
            }
        }
    }
}

/// The one path every role/table/privilege mutation goes through: read the role's
/// grants, diff them against the desired state, and execute the plan, all on the
/// caller's transaction.
#[derive(Debug, Clone)]
pub struct Reconciler {
    default_privileges: PrivilegeSet,
}

impl Reconciler {
    pub fn new(default_privileges: PrivilegeSet) -> Self {
        Self { default_privileges }
    }

    pub fn default_privileges(&self) -> &PrivilegeSet {
        &self.default_privileges
    }

    pub async fn reconcile(
        &self,
        conn: &mut PgConnection,
        role: &Identifier,
        edit: GrantEdit,
    ) -> Result<ReconcileOutcome, WardenError> {
        let current = catalog::current_grants(&mut *conn, role).await?;
        let desired = edit.desired(&current, &self.default_privileges);
        let plan = diff(&current, &desired);
        with_pretty_json_debug(&plan, |pretty| {
            debug!(role = %role.as_str(), "Reconciliation plan:\n{pretty}");
        });
        let statements = executor::execute_plan(&mut *conn, role, &plan).await?;
        Ok(ReconcileOutcome { plan, statements })
    }

    /// CREATE ROLE plus its initial grants, in one transaction.
    pub async fn create_role(
        &self,
        pool: &PgPool,
        role: &Identifier,
        desired: DesiredState,
    ) -> Result<ReconcileOutcome, WardenError> {
        let mut tx = pool.begin().await?;
        let result = self.create_role_in(&mut tx, role, desired).await;
        let outcome = finish(tx, result).await?;
        info!(role = %role.as_str(), statements = outcome.statements, "Role created");
        Ok(outcome)
    }

    async fn create_role_in(
        &self,
        conn: &mut PgConnection,
        role: &Identifier,
        desired: DesiredState,
    ) -> Result<ReconcileOutcome, WardenError> {
        if catalog::role_exists(&mut *conn, role.as_str()).await? {
            return Err(WardenError::validation(format!(
                "role `{}` already exists",
                role.as_str()
            )));
        }
        executor::execute_role(&mut *conn, &RoleStatement::Create { role: role.clone() }).await?;
        self.reconcile(conn, role, GrantEdit::Replace(desired)).await
    }

    /// Applies `edit` to an existing role in one transaction. Unknown roles are a 404.
    pub async fn edit_role(
        &self,
        pool: &PgPool,
        role: &Identifier,
        edit: GrantEdit,
    ) -> Result<ReconcileOutcome, WardenError> {
        let mut tx = pool.begin().await?;
        let result = self.edit_role_in(&mut tx, role, edit).await;
        finish(tx, result).await
    }

    async fn edit_role_in(
        &self,
        conn: &mut PgConnection,
        role: &Identifier,
        edit: GrantEdit,
    ) -> Result<ReconcileOutcome, WardenError> {
        ensure_role(&mut *conn, role).await?;
        self.reconcile(conn, role, edit).await
    }

    /// Membership-only edit: `tables` becomes the role's full table list.
    pub async fn set_tables(
        &self,
        pool: &PgPool,
        role: &Identifier,
        tables: Vec<Identifier>,
    ) -> Result<ReconcileOutcome, WardenError> {
        let outcome = self.edit_role(pool, role, GrantEdit::Tables(tables)).await?;
        info!(role = %role.as_str(), statements = outcome.statements, "Role tables updated");
        Ok(outcome)
    }

    /// Single-table edit; an empty set removes the table from the role.
    pub async fn set_table_privileges(
        &self,
        pool: &PgPool,
        role: &Identifier,
        table: Identifier,
        privileges: PrivilegeSet,
    ) -> Result<ReconcileOutcome, WardenError> {
        let table_name = table.as_str().to_string();
        let outcome = self
            .edit_role(pool, role, GrantEdit::TablePrivileges { table, privileges })
            .await?;
        info!(
            role = %role.as_str(),
            table = %table_name,
            statements = outcome.statements,
            "Role privileges updated"
        );
        Ok(outcome)
    }

    /// DROP ROLE. When dependent objects block it the transaction rolls back and the
    /// role remains.
    pub async fn drop_role(&self, pool: &PgPool, role: &Identifier) -> Result<(), WardenError> {
        let mut tx = pool.begin().await?;
        let result = drop_role_in(&mut tx, role).await;
        finish(tx, result).await?;
        info!(role = %role.as_str(), "Role dropped");
        Ok(())
    }
}

async fn ensure_role(conn: &mut PgConnection, role: &Identifier) -> Result<(), WardenError> {
    if catalog::role_exists(conn, role.as_str()).await? {
        Ok(())
    } else {
        Err(WardenError::not_found("role", role.as_str()))
    }
}

async fn drop_role_in(conn: &mut PgConnection, role: &Identifier) -> Result<(), WardenError> {
    ensure_role(&mut *conn, role).await?;
    executor::execute_role(conn, &RoleStatement::Drop { role: role.clone() }).await
}
