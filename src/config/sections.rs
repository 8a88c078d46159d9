use serde::{Deserialize, Serialize};

/// Connection pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// TOML: `database.max_connections`. Default: `10`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing the request.
    /// TOML: `database.acquire_timeout_secs`. Default: `10`.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Privilege reconciliation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrantsConfig {
    /// Privileges given to a table when it is added to a role without an explicit list.
    /// TOML: `grants.default_privileges`. Default: `["SELECT"]`.
    #[serde(default = "default_privileges")]
    pub default_privileges: Vec<String>,
}

impl Default for GrantsConfig {
    fn default() -> Self {
        Self {
            default_privileges: default_privileges(),
        }
    }
}

/// Ad-hoc SQL console settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    /// Tables that may not be the last token of a console command (they need LIMIT/OFFSET).
    /// TOML: `console.sensitive_tables`.
    #[serde(default = "default_sensitive_tables")]
    pub sensitive_tables: Vec<String>,

    /// Run console commands inside a READ ONLY transaction that is always rolled back.
    /// TOML: `console.read_only`. Default: `true`.
    #[serde(default = "default_true")]
    pub read_only: bool,

    /// Maximum rows returned per command.
    /// TOML: `console.max_rows`. Default: `1000`.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            sensitive_tables: default_sensitive_tables(),
            read_only: true,
            max_rows: default_max_rows(),
        }
    }
}

/// Login throttling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Login attempts allowed per username per minute.
    /// TOML: `auth.login_attempts_per_minute`. Default: `10`.
    #[serde(default = "default_login_attempts_per_minute")]
    pub login_attempts_per_minute: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_attempts_per_minute: default_login_attempts_per_minute(),
        }
    }
}

/// Login-role management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsersConfig {
    /// Users that cannot be created, altered or dropped through the API.
    /// TOML: `users.protected`. Default: `["postgres"]`.
    #[serde(default = "default_protected_users")]
    pub protected: Vec<String>,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            protected: default_protected_users(),
        }
    }
}

impl UsersConfig {
    pub fn is_protected(&self, username: &str) -> bool {
        self.protected.iter().any(|p| p == username)
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn default_privileges() -> Vec<String> {
    vec!["SELECT".to_string()]
}

fn default_sensitive_tables() -> Vec<String> {
    ["bookings", "payments", "tickets", "seats", "customers"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_max_rows() -> usize {
    1000
}

fn default_login_attempts_per_minute() -> u32 {
    10
}

fn default_protected_users() -> Vec<String> {
    vec!["postgres".to_string()]
}
