use crate::ident::Identifier;
use crate::privilege::PrivilegeSet;
use serde::Serialize;
use std::fmt;

/// One GRANT/REVOKE statement against a single table.
///
/// Rendering goes through `Display` so that every identifier is emitted quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrantStatement {
    RevokeAll {
        table: Identifier,
        role: Identifier,
    },
    Grant {
        privileges: PrivilegeSet,
        table: Identifier,
        role: Identifier,
    },
    Revoke {
        privileges: PrivilegeSet,
        table: Identifier,
        role: Identifier,
    },
}

impl GrantStatement {
    pub fn table(&self) -> &Identifier {
        match self {
            GrantStatement::RevokeAll { table, .. }
            | GrantStatement::Grant { table, .. }
            | GrantStatement::Revoke { table, .. } => table,
        }
    }

    pub fn is_revoke(&self) -> bool {
        !matches!(self, GrantStatement::Grant { .. })
    }

    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GrantStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantStatement::RevokeAll { table, role } => {
                write!(f, "REVOKE ALL ON TABLE {table} FROM {role}")
            }
            GrantStatement::Grant {
                privileges,
                table,
                role,
            } => write!(f, "GRANT {privileges} ON TABLE {table} TO {role}"),
            GrantStatement::Revoke {
                privileges,
                table,
                role,
            } => write!(f, "REVOKE {privileges} ON TABLE {table} FROM {role}"),
        }
    }
}

/// Role lifecycle and membership DDL issued by the user/role endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStatement {
    Create {
        role: Identifier,
    },
    CreateLogin {
        role: Identifier,
        password_literal: String,
    },
    SetPassword {
        role: Identifier,
        password_literal: String,
    },
    Rename {
        from: Identifier,
        to: Identifier,
    },
    GrantMembership {
        group: Identifier,
        member: Identifier,
    },
    RevokeMembership {
        group: Identifier,
        member: Identifier,
    },
    Drop {
        role: Identifier,
    },
}

impl RoleStatement {
    pub fn create_login(role: Identifier, password: &str) -> Self {
        RoleStatement::CreateLogin {
            role,
            password_literal: crate::ident::quote_literal(password),
        }
    }

    pub fn set_password(role: Identifier, password: &str) -> Self {
        RoleStatement::SetPassword {
            role,
            password_literal: crate::ident::quote_literal(password),
        }
    }

    /// Statement text with the password literal masked, for logs and error reports.
    pub fn redacted(&self) -> String {
        match self {
            RoleStatement::CreateLogin { role, .. } => {
                format!("CREATE ROLE {role} LOGIN PASSWORD '***'")
            }
            RoleStatement::SetPassword { role, .. } => {
                format!("ALTER ROLE {role} WITH PASSWORD '***'")
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for RoleStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleStatement::Create { role } => write!(f, "CREATE ROLE {role}"),
            RoleStatement::CreateLogin {
                role,
                password_literal,
            } => write!(f, "CREATE ROLE {role} LOGIN PASSWORD {password_literal}"),
            RoleStatement::SetPassword {
                role,
                password_literal,
            } => write!(f, "ALTER ROLE {role} WITH PASSWORD {password_literal}"),
            RoleStatement::Rename { from, to } => write!(f, "ALTER ROLE {from} RENAME TO {to}"),
            RoleStatement::GrantMembership { group, member } => {
                write!(f, "GRANT {group} TO {member}")
            }
            RoleStatement::RevokeMembership { group, member } => {
                write!(f, "REVOKE {group} FROM {member}")
            }
            RoleStatement::Drop { role } => write!(f, "DROP ROLE {role}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::Privilege;

    fn ident(name: &str) -> Identifier {
        Identifier::parse(name).unwrap()
    }

    #[test]
    fn renders_quoted_grant_statements() {
        let grant = GrantStatement::Grant {
            privileges: PrivilegeSet::from([Privilege::Insert, Privilege::Select]),
            table: ident("orders"),
            role: ident("clerk"),
        };
        assert_eq!(
            grant.to_sql(),
            r#"GRANT SELECT, INSERT ON TABLE "orders" TO "clerk""#
        );

        let revoke_all = GrantStatement::RevokeAll {
            table: ident("Orders"),
            role: ident("clerk"),
        };
        assert_eq!(
            revoke_all.to_sql(),
            r#"REVOKE ALL ON TABLE "Orders" FROM "clerk""#
        );
        assert!(revoke_all.is_revoke());
        assert!(!grant.is_revoke());
    }

    #[test]
    fn password_is_quoted_and_redacted() {
        let stmt = RoleStatement::create_login(ident("alice"), "pa'ss");
        assert_eq!(
            stmt.to_string(),
            r#"CREATE ROLE "alice" LOGIN PASSWORD 'pa''ss'"#
        );
        assert_eq!(
            stmt.redacted(),
            r#"CREATE ROLE "alice" LOGIN PASSWORD '***'"#
        );
    }

    #[test]
    fn renders_membership_and_lifecycle() {
        let group = ident("readers");
        let member = ident("alice");
        assert_eq!(
            RoleStatement::GrantMembership {
                group: group.clone(),
                member: member.clone()
            }
            .to_string(),
            r#"GRANT "readers" TO "alice""#
        );
        assert_eq!(
            RoleStatement::Rename {
                from: member.clone(),
                to: ident("alicia")
            }
            .redacted(),
            r#"ALTER ROLE "alice" RENAME TO "alicia""#
        );
        assert_eq!(
            RoleStatement::Drop { role: group }.to_string(),
            r#"DROP ROLE "readers""#
        );
    }
}
