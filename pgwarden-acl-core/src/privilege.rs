use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Table-level privilege kinds grantable through this console.
///
/// Declaration order is the canonical display order (the order `psql \dp` uses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Privilege {
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    References,
    Trigger,
}

impl Privilege {
    pub const ALL: [Privilege; 7] = [
        Privilege::Select,
        Privilege::Insert,
        Privilege::Update,
        Privilege::Delete,
        Privilege::Truncate,
        Privilege::References,
        Privilege::Trigger,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::Truncate => "TRUNCATE",
            Privilege::References => "REFERENCES",
            Privilege::Trigger => "TRIGGER",
        }
    }

    /// Short human description shown next to the privilege in the console UI.
    pub fn description(self) -> &'static str {
        match self {
            Privilege::Select => "Read data",
            Privilege::Insert => "Add new records",
            Privilege::Update => "Modify records",
            Privilege::Delete => "Remove records",
            Privilege::Truncate => "Delete all records",
            Privilege::References => "Create foreign keys",
            Privilege::Trigger => "Create triggers",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("unknown privilege kind `{0}`")]
pub struct PrivilegeParseError(pub String);

impl FromStr for Privilege {
    type Err = PrivilegeParseError;

    /// Matches the catalog spelling exactly (`information_schema` reports uppercase).
    /// Request payloads are uppercased by the caller before parsing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Privilege::ALL
            .into_iter()
            .find(|p| p.as_sql() == s)
            .ok_or_else(|| PrivilegeParseError(s.to_string()))
    }
}

/// Ordered set of privileges on a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivilegeSet(BTreeSet<Privilege>);

impl PrivilegeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, privilege: Privilege) -> bool {
        self.0.contains(&privilege)
    }

    pub fn insert(&mut self, privilege: Privilege) -> bool {
        self.0.insert(privilege)
    }

    pub fn remove(&mut self, privilege: Privilege) -> bool {
        self.0.remove(&privilege)
    }

    pub fn iter(&self) -> impl Iterator<Item = Privilege> + '_ {
        self.0.iter().copied()
    }

    /// `self − other`.
    pub fn difference(&self, other: &PrivilegeSet) -> PrivilegeSet {
        Self(self.0.difference(&other.0).copied().collect())
    }

    pub fn union(&self, other: &PrivilegeSet) -> PrivilegeSet {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// Parses request-supplied privilege names, case-insensitively.
    pub fn parse_names<I, S>(names: I) -> Result<Self, PrivilegeParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_uppercase().parse())
            .collect()
    }

    pub fn to_names(&self) -> Vec<String> {
        self.iter().map(|p| p.as_sql().to_string()).collect()
    }
}

impl FromIterator<Privilege> for PrivilegeSet {
    fn from_iter<T: IntoIterator<Item = Privilege>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Privilege; N]> for PrivilegeSet {
    fn from(value: [Privilege; N]) -> Self {
        value.into_iter().collect()
    }
}

/// Comma-joined SQL list, e.g. `SELECT, INSERT`.
impl fmt::Display for PrivilegeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, privilege) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(privilege.as_sql())?;
        }
        Ok(())
    }
}
