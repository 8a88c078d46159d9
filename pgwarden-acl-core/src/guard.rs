//! Deny-list filter for ad-hoc console SQL.
//!
//! This is a whitespace tokenizer, not a SQL parser. Tokens glued to punctuation
//! (`drop;`, `(delete`), comments and quoted identifiers pass through unrecognized.
//! The server wraps allowed commands in a read-only transaction for that reason.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Verbs that make a console command non-diagnostic.
pub const DISALLOWED_VERBS: [&str; 10] = [
    "drop", "delete", "truncate", "alter", "rename", "create", "insert", "update", "grant",
    "revoke",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum GuardRejection {
    EmptyCommand,
    DisallowedVerb { verb: String },
    UnboundedSensitiveTable { table: String },
}

impl fmt::Display for GuardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardRejection::EmptyCommand => f.write_str("command is empty"),
            GuardRejection::DisallowedVerb { verb } => {
                write!(f, "`{verb}` is not allowed in the console")
            }
            GuardRejection::UnboundedSensitiveTable { table } => write!(
                f,
                "queries ending in sensitive table `{table}` need a LIMIT/OFFSET clause"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandGuard {
    sensitive_tables: BTreeSet<String>,
}

impl CommandGuard {
    pub fn new<I, S>(sensitive_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            sensitive_tables: sensitive_tables
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn sensitive_tables(&self) -> impl Iterator<Item = &str> {
        self.sensitive_tables.iter().map(String::as_str)
    }

    pub fn check(&self, command: &str) -> Result<(), GuardRejection> {
        let tokens: Vec<String> = command
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect();

        let Some(last) = tokens.last() else {
            return Err(GuardRejection::EmptyCommand);
        };

        if let Some(verb) = tokens
            .iter()
            .find(|token| DISALLOWED_VERBS.contains(&token.as_str()))
        {
            return Err(GuardRejection::DisallowedVerb { verb: verb.clone() });
        }

        if self.sensitive_tables.contains(last) {
            return Err(GuardRejection::UnboundedSensitiveTable {
                table: last.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> CommandGuard {
        CommandGuard::new(["bookings", "payments", "seats", "Tickets"])
    }

    #[test]
    fn rejects_destructive_verbs_in_any_case() {
        assert_eq!(
            guard().check("drop table bookings"),
            Err(GuardRejection::DisallowedVerb {
                verb: "drop".to_string()
            })
        );
        assert_eq!(
            guard().check("DELETE FROM seats"),
            Err(GuardRejection::DisallowedVerb {
                verb: "delete".to_string()
            })
        );
        assert!(guard().check("select 1;\n  UpDaTe movies set x = 1").is_err());
    }

    #[test]
    fn rejects_unbounded_scan_of_sensitive_table() {
        assert_eq!(
            guard().check("select * from payments"),
            Err(GuardRejection::UnboundedSensitiveTable {
                table: "payments".to_string()
            })
        );
        assert!(guard().check("SELECT * FROM TICKETS").is_err());
    }

    #[test]
    fn accepts_bounded_and_ordinary_reads() {
        assert_eq!(guard().check("select * from movies limit 10"), Ok(()));
        assert_eq!(guard().check("select * from payments limit 10"), Ok(()));
        assert_eq!(guard().check("select count(*) from bookings where id > 3"), Ok(()));
    }

    #[test]
    fn rejects_blank_commands() {
        assert_eq!(guard().check("  \n\t "), Err(GuardRejection::EmptyCommand));
    }

    #[test]
    fn punctuation_glued_tokens_are_a_known_gap() {
        assert_eq!(guard().check("select 1; drop; "), Ok(()));
        assert_eq!(guard().check("select * from payments;"), Ok(()));
    }

    #[test]
    fn verb_substrings_do_not_trigger() {
        assert_eq!(guard().check("select created_at, updated_by from movies limit 1"), Ok(()));
    }
}
