use super::reconcile::finish;
use crate::config::UsersConfig;
use crate::db::{catalog, executor};
use crate::error::WardenError;
use pgwarden_acl_core::{Identifier, RoleStatement};
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

/// Requested changes to a login role. `None` leaves that aspect untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub password: Option<String>,
    pub rename_to: Option<Identifier>,
    /// Makes `role` the user's only non-`pg_` group.
    pub role: Option<Identifier>,
}

pub fn ensure_unprotected(users: &UsersConfig, name: &str) -> Result<(), WardenError> {
    if users.is_protected(name) {
        Err(WardenError::validation(format!(
            "user `{name}` is protected and cannot be managed here"
        )))
    } else {
        Ok(())
    }
}

pub fn ensure_password(password: &str) -> Result<(), WardenError> {
    if password.is_empty() {
        Err(WardenError::validation("password must not be empty"))
    } else {
        Ok(())
    }
}

/// Membership statements that move `member` from `current` groups to `desired`.
pub fn membership_statements(
    member: &Identifier,
    current: &[String],
    desired: Option<&Identifier>,
) -> Vec<RoleStatement> {
    let mut out = Vec::new();
    for group in current {
        if desired.is_some_and(|d| d.as_str() == group) {
            continue;
        }
        match Identifier::parse(group) {
            Ok(group) => out.push(RoleStatement::RevokeMembership {
                group,
                member: member.clone(),
            }),
            Err(err) => {
                warn!(member = %member.as_str(), group = %group, error = %err, "Skipping membership on unmanageable role");
            }
        }
    }
    if let Some(desired) = desired
        && !current.iter().any(|g| g == desired.as_str())
    {
        out.push(RoleStatement::GrantMembership {
            group: desired.clone(),
            member: member.clone(),
        });
    }
    out
}

async fn ensure_login_role(conn: &mut PgConnection, name: &Identifier) -> Result<(), WardenError> {
    if catalog::login_role_exists(conn, name.as_str()).await? {
        Ok(())
    } else {
        Err(WardenError::not_found("user", name.as_str()))
    }
}

/// First non-`pg_` role the user belongs to.
pub async fn user_role(pool: &PgPool, username: &Identifier) -> Result<Option<String>, WardenError> {
    let mut conn = pool.acquire().await?;
    ensure_login_role(&mut conn, username).await?;
    let groups = catalog::memberships(&mut conn, username.as_str()).await?;
    Ok(groups.into_iter().next())
}

pub async fn create_user(
    pool: &PgPool,
    username: &Identifier,
    password: &str,
    role: Option<&Identifier>,
) -> Result<(), WardenError> {
    let mut tx = pool.begin().await?;
    let result = create_user_in(&mut tx, username, password, role).await;
    finish(tx, result).await?;
    info!(user = %username.as_str(), role = ?role.map(Identifier::as_str), "User created");
    Ok(())
}

async fn create_user_in(
    conn: &mut PgConnection,
    username: &Identifier,
    password: &str,
    role: Option<&Identifier>,
) -> Result<(), WardenError> {
    if catalog::role_exists(&mut *conn, username.as_str()).await? {
        return Err(WardenError::validation(format!(
            "role `{}` already exists",
            username.as_str()
        )));
    }
    if let Some(role) = role
        && !catalog::role_exists(&mut *conn, role.as_str()).await?
    {
        return Err(WardenError::not_found("role", role.as_str()));
    }
    executor::execute_role(&mut *conn, &RoleStatement::create_login(username.clone(), password))
        .await?;
    for statement in membership_statements(username, &[], role) {
        executor::execute_role(&mut *conn, &statement).await?;
    }
    Ok(())
}

/// Applies password, membership and rename changes in one transaction. The rename runs
/// last so every earlier statement refers to the existing name. Returns the final name.
pub async fn update_user(
    pool: &PgPool,
    username: &Identifier,
    changes: UserChanges,
) -> Result<Identifier, WardenError> {
    let mut tx = pool.begin().await?;
    let result = update_user_in(&mut tx, username, changes).await;
    let final_name = finish(tx, result).await?;
    info!(user = %username.as_str(), now = %final_name.as_str(), "User updated");
    Ok(final_name)
}

async fn update_user_in(
    conn: &mut PgConnection,
    username: &Identifier,
    changes: UserChanges,
) -> Result<Identifier, WardenError> {
    ensure_login_role(&mut *conn, username).await?;

    if let Some(password) = changes.password.as_deref() {
        executor::execute_role(&mut *conn, &RoleStatement::set_password(username.clone(), password))
            .await?;
    }

    if let Some(role) = changes.role.as_ref() {
        if !catalog::role_exists(&mut *conn, role.as_str()).await? {
            return Err(WardenError::not_found("role", role.as_str()));
        }
        let current = catalog::memberships(&mut *conn, username.as_str()).await?;
        for statement in membership_statements(username, &current, Some(role)) {
            executor::execute_role(&mut *conn, &statement).await?;
        }
    }

    match changes.rename_to {
        Some(to) if to != *username => {
            if catalog::role_exists(&mut *conn, to.as_str()).await? {
                return Err(WardenError::validation(format!(
                    "role `{}` already exists",
                    to.as_str()
                )));
            }
            executor::execute_role(
                &mut *conn,
                &RoleStatement::Rename {
                    from: username.clone(),
                    to: to.clone(),
                },
            )
            .await?;
            Ok(to)
        }
        _ => Ok(username.clone()),
    }
}

pub async fn delete_user(pool: &PgPool, username: &Identifier) -> Result<(), WardenError> {
    let mut tx = pool.begin().await?;
    let result = delete_user_in(&mut tx, username).await;
    finish(tx, result).await?;
    info!(user = %username.as_str(), "User dropped");
    Ok(())
}

async fn delete_user_in(conn: &mut PgConnection, username: &Identifier) -> Result<(), WardenError> {
    ensure_login_role(&mut *conn, username).await?;
    executor::execute_role(conn, &RoleStatement::Drop { role: username.clone() }).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Identifier {
        Identifier::parse(name).unwrap()
    }

    #[test]
    fn membership_moves_to_the_desired_group() {
        let statements = membership_statements(
            &id("alice"),
            &["clerk".to_string(), "auditor".to_string()],
            Some(&id("manager")),
        );
        let rendered: Vec<String> = statements.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                r#"REVOKE "clerk" FROM "alice""#,
                r#"REVOKE "auditor" FROM "alice""#,
                r#"GRANT "manager" TO "alice""#,
            ]
        );
    }

    #[test]
    fn existing_membership_is_kept() {
        let statements =
            membership_statements(&id("alice"), &["clerk".to_string()], Some(&id("clerk")));
        assert!(statements.is_empty());
    }

    #[test]
    fn clearing_role_revokes_everything() {
        let statements = membership_statements(&id("alice"), &["clerk".to_string()], None);
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], RoleStatement::RevokeMembership { .. }));
    }

    #[test]
    fn protected_users_are_refused() {
        let users = UsersConfig::default();
        assert!(ensure_unprotected(&users, "postgres").is_err());
        assert!(ensure_unprotected(&users, "alice").is_ok());
    }
}
