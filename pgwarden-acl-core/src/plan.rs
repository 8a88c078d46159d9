//! Desired-state differ and the reconciliation plan it produces.
//!
//! `diff` is pure and total: any pair of grant matrices yields a plan, and applying
//! that plan to the current state yields exactly the desired state. Every table lands
//! in at most one bucket of the plan.

use crate::ident::Identifier;
use crate::matrix::{CurrentState, DesiredState, GrantMatrix};
use crate::privilege::PrivilegeSet;
use crate::statement::GrantStatement;
use serde::Serialize;
use std::collections::BTreeMap;

/// Privilege changes on a table the role keeps access to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeDiff {
    pub to_grant: PrivilegeSet,
    pub to_revoke: PrivilegeSet,
}

impl PrivilegeDiff {
    pub fn is_empty(&self) -> bool {
        self.to_grant.is_empty() && self.to_revoke.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationPlan {
    /// Tables the role loses all access to.
    pub tables_to_revoke_all: Vec<Identifier>,
    /// Tables the role gains access to, with the privileges to grant on each.
    pub tables_to_grant_default: BTreeMap<Identifier, PrivilegeSet>,
    /// Tables present on both sides whose privilege sets differ.
    pub per_table_privilege_diff: BTreeMap<Identifier, PrivilegeDiff>,
}

/// Computes the minimal plan that moves `current` to `desired`.
pub fn diff(current: &CurrentState, desired: &DesiredState) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    for (table, held) in current.iter() {
        match desired.get(table) {
            None => plan.tables_to_revoke_all.push(table.clone()),
            Some(wanted) => {
                let change = PrivilegeDiff {
                    to_grant: wanted.difference(held),
                    to_revoke: held.difference(wanted),
                };
                if !change.is_empty() {
                    plan.per_table_privilege_diff.insert(table.clone(), change);
                }
            }
        }
    }

    for (table, wanted) in desired.iter() {
        if !current.contains_table(table) {
            plan.tables_to_grant_default
                .insert(table.clone(), wanted.clone());
        }
    }

    plan
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.tables_to_revoke_all.is_empty()
            && self.tables_to_grant_default.is_empty()
            && self.per_table_privilege_diff.is_empty()
    }

    /// Renders the plan for `role` in execution order: full revokes, new-table grants,
    /// per-table revokes, per-table grants.
    pub fn statements(&self, role: &Identifier) -> Vec<GrantStatement> {
        let mut out = Vec::new();

        out.extend(
            self.tables_to_revoke_all
                .iter()
                .map(|table| GrantStatement::RevokeAll {
                    table: table.clone(),
                    role: role.clone(),
                }),
        );

        out.extend(
            self.tables_to_grant_default
                .iter()
                .map(|(table, privileges)| GrantStatement::Grant {
                    privileges: privileges.clone(),
                    table: table.clone(),
                    role: role.clone(),
                }),
        );

        out.extend(
            self.per_table_privilege_diff
                .iter()
                .filter(|(_, change)| !change.to_revoke.is_empty())
                .map(|(table, change)| GrantStatement::Revoke {
                    privileges: change.to_revoke.clone(),
                    table: table.clone(),
                    role: role.clone(),
                }),
        );

        out.extend(
            self.per_table_privilege_diff
                .iter()
                .filter(|(_, change)| !change.to_grant.is_empty())
                .map(|(table, change)| GrantStatement::Grant {
                    privileges: change.to_grant.clone(),
                    table: table.clone(),
                    role: role.clone(),
                }),
        );

        out
    }

    /// The state a role would hold after this plan runs against `current`.
    pub fn apply_to(&self, current: &CurrentState) -> GrantMatrix {
        let mut next = current.clone();
        for table in &self.tables_to_revoke_all {
            next.remove(table);
        }
        for (table, privileges) in &self.tables_to_grant_default {
            let merged = next
                .get(table)
                .map(|held| held.union(privileges))
                .unwrap_or_else(|| privileges.clone());
            next.set(table.clone(), merged);
        }
        for (table, change) in &self.per_table_privilege_diff {
            let held = next.get(table).cloned().unwrap_or_default();
            next.set(
                table.clone(),
                held.difference(&change.to_revoke).union(&change.to_grant),
            );
        }
        next
    }
}
