use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub is_superuser: bool,
    #[serde(rename = "isCreateDB")]
    pub is_create_db: bool,
    pub is_replicable: bool,
    #[serde(rename = "byPassRLS")]
    pub bypass_rls: bool,
    pub password_expire: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    /// Group role to grant membership in.
    #[serde(default)]
    pub role: Option<String>,
}

/// Partial update; empty strings are treated like absent fields.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserRoleResponse {
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_summary_keeps_console_field_names() {
        let user = UserSummary {
            username: "alice".to_string(),
            is_superuser: false,
            is_create_db: true,
            is_replicable: false,
            bypass_rls: false,
            password_expire: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isCreateDB"], true);
        assert_eq!(json["byPassRLS"], false);
        assert_eq!(json["isReplicable"], false);
        assert!(json["passwordExpire"].is_null());
    }

    #[test]
    fn update_user_request_fields_are_optional() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"password":"s3cret"}"#).unwrap();
        assert_eq!(req.password.as_deref(), Some("s3cret"));
        assert!(req.username.is_none());
        assert!(req.role.is_none());
    }
}
