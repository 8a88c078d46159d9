use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error as ThisError;

/// PostgreSQL truncates identifiers longer than `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
    #[error("identifier must not be empty")]
    Empty,

    #[error("identifier `{0}` exceeds {MAX_IDENTIFIER_LEN} bytes")]
    TooLong(String),

    #[error("identifier `{0}` contains characters outside [A-Za-z0-9_] or starts with a digit")]
    InvalidCharacters(String),

    #[error("role name `{0}` must match ^[a-z_][a-z0-9_]*$")]
    NotLowercase(String),

    #[error("identifier `{0}` uses the reserved `pg_` prefix")]
    Reserved(String),
}

/// A validated SQL identifier (role or table name).
///
/// Construction enforces `^[A-Za-z_][A-Za-z0-9_]*$`. `Display` always renders the
/// double-quoted form, so every statement that formats an `Identifier` gets a quoted,
/// case-preserving name. Use [`Identifier::as_str`] for bind parameters and JSON.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates an identifier that refers to an existing object.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if raw.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong(raw.to_string()));
        }
        let mut chars = raw.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(IdentifierError::InvalidCharacters(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Validates the name of a role about to be created.
    ///
    /// New roles are restricted to lowercase so that the quoted name matches what an
    /// unquoted reference in hand-written SQL would resolve to.
    pub fn parse_new_role(raw: &str) -> Result<Self, IdentifierError> {
        let ident = Self::parse(raw)?;
        if raw.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(IdentifierError::NotLowercase(raw.to_string()));
        }
        if raw.starts_with("pg_") {
            return Err(IdentifierError::Reserved(raw.to_string()));
        }
        Ok(ident)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_ident(&self.0))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Single-quotes a string literal for statements that cannot take bind parameters
/// (`PASSWORD '...'`). Assumes `standard_conforming_strings = on`, the server default.
pub fn quote_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for c in raw.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
