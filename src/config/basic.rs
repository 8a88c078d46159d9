use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// TOML: `basic.listen_addr`. Default: `127.0.0.1`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// TOML: `basic.listen_port`. Default: `8190`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// PostgreSQL connection string of the administered database (required).
    /// TOML: `basic.database_url`. Env: `DATABASE_URL`.
    #[serde(default)]
    pub database_url: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default)]
    pub loglevel: String,

    /// Secret the session cookie encryption key is derived from (required, >= 32 bytes).
    /// TOML: `basic.session_secret`. Env: `SESSION_SECRET`.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub session_secret: String,

    /// Session lifetime in seconds.
    /// TOML: `basic.session_ttl_secs`. Default: `3600`.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Drop the `Secure` attribute from the session cookie (plain-HTTP local setups only).
    /// TOML: `basic.insecure_cookie`. Default: `false`.
    #[serde(default)]
    pub insecure_cookie: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            // No usable defaults. `Config::validate()` enforces both.
            database_url: String::new(),
            loglevel: "info".to_string(),
            session_secret: String::new(),
            session_ttl_secs: default_session_ttl_secs(),
            insecure_cookie: false,
        }
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for basic.session_secret",
        )),
    }
}

/// Default IP address for the HTTP server listen address.
fn default_listen_ip() -> IpAddr {
    Ipv4Addr::LOCALHOST.into()
}

/// Default port for the HTTP server.
fn default_listen_port() -> u16 {
    8190
}

fn default_session_ttl_secs() -> u64 {
    3600
}
