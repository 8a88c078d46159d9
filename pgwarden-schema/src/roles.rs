use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TablePrivileges {
    pub name: String,
    pub privileges: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoleGrants {
    pub role: String,
    pub tables: Vec<TablePrivileges>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    pub role: String,
    #[serde(default)]
    pub table_and_privileges: Vec<TablePrivileges>,
}

/// Membership-only edit: the complete list of tables the role should reach.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleTablesRequest {
    pub updated_tables: Vec<String>,
}

/// Privilege edit on one table; an empty list removes access to the table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePrivilegesRequest {
    pub table: String,
    pub updated_privileges: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PrivilegeInfo {
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_role_request_uses_camel_case() {
        let req: CreateRoleRequest = serde_json::from_str(
            r#"{"role":"clerk","tableAndPrivileges":[{"name":"movies","privileges":["SELECT"]}]}"#,
        )
        .unwrap();
        assert_eq!(req.role, "clerk");
        assert_eq!(req.table_and_privileges.len(), 1);
        assert_eq!(req.table_and_privileges[0].privileges, vec!["SELECT"]);
    }

    #[test]
    fn create_role_request_defaults_to_no_tables() {
        let req: CreateRoleRequest = serde_json::from_str(r#"{"role":"clerk"}"#).unwrap();
        assert!(req.table_and_privileges.is_empty());
    }

    #[test]
    fn update_requests_parse() {
        let tables: UpdateRoleTablesRequest =
            serde_json::from_str(r#"{"updatedTables":["orders","invoices"]}"#).unwrap();
        assert_eq!(tables.updated_tables, vec!["orders", "invoices"]);

        let privs: UpdateRolePrivilegesRequest =
            serde_json::from_str(r#"{"table":"orders","updatedPrivileges":[]}"#).unwrap();
        assert!(privs.updated_privileges.is_empty());
    }
}
