use crate::ident::Identifier;
use crate::privilege::{Privilege, PrivilegeSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// Table → privileges held by (or desired for) one role.
///
/// An empty privilege set is never stored: inserting one removes the table, so
/// "no access" is always the absence of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GrantMatrix(BTreeMap<Identifier, PrivilegeSet>);

/// Grants currently held by a role, as read from the catalog.
pub type CurrentState = GrantMatrix;

/// Grants the caller wants a role to end up with.
pub type DesiredState = GrantMatrix;

impl GrantMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, table: &Identifier) -> Option<&PrivilegeSet> {
        self.0.get(table)
    }

    pub fn contains_table(&self, table: &Identifier) -> bool {
        self.0.contains_key(table)
    }

    /// Replaces the privileges on `table`; an empty set removes the table.
    pub fn set(&mut self, table: Identifier, privileges: PrivilegeSet) {
        if privileges.is_empty() {
            self.0.remove(&table);
        } else {
            self.0.insert(table, privileges);
        }
    }

    /// Adds one privilege, creating the table entry when needed.
    pub fn grant(&mut self, table: Identifier, privilege: Privilege) {
        self.0.entry(table).or_default().insert(privilege);
    }

    pub fn remove(&mut self, table: &Identifier) -> Option<PrivilegeSet> {
        self.0.remove(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &PrivilegeSet)> {
        self.0.iter()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Identifier> {
        self.0.keys()
    }

    /// Desired state for a membership-only edit: retained tables keep their current
    /// privileges, newly listed tables receive `default`, unlisted tables are dropped.
    pub fn with_table_membership<I>(current: &CurrentState, tables: I, default: &PrivilegeSet) -> Self
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut desired = Self::new();
        for table in tables {
            let privileges = current.get(&table).cloned().unwrap_or_else(|| default.clone());
            desired.set(table, privileges);
        }
        desired
    }

    /// Desired state for a single-table edit: every other table is left as it is.
    pub fn with_table_privileges(
        current: &CurrentState,
        table: Identifier,
        privileges: PrivilegeSet,
    ) -> Self {
        let mut desired = current.clone();
        desired.set(table, privileges);
        desired
    }
}

impl FromIterator<(Identifier, PrivilegeSet)> for GrantMatrix {
    fn from_iter<T: IntoIterator<Item = (Identifier, PrivilegeSet)>>(iter: T) -> Self {
        let mut matrix = Self::new();
        for (table, privileges) in iter {
            matrix.set(table, privileges);
        }
        matrix
    }
}

impl IntoIterator for GrantMatrix {
    type Item = (Identifier, PrivilegeSet);
    type IntoIter = std::collections::btree_map::IntoIter<Identifier, PrivilegeSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> Identifier {
        Identifier::parse(name).unwrap()
    }

    #[test]
    fn empty_privilege_sets_are_never_stored() {
        let mut matrix = GrantMatrix::new();
        matrix.set(t("orders"), PrivilegeSet::new());
        assert!(matrix.is_empty());

        matrix.set(t("orders"), PrivilegeSet::from([Privilege::Select]));
        matrix.set(t("orders"), PrivilegeSet::new());
        assert!(!matrix.contains_table(&t("orders")));

        let collected: GrantMatrix = [(t("a"), PrivilegeSet::new())].into_iter().collect();
        assert!(collected.is_empty());
    }

    #[test]
    fn membership_keeps_existing_privileges_and_defaults_new_tables() {
        let current: CurrentState = [
            (t("orders"), PrivilegeSet::from([Privilege::Select, Privilege::Insert])),
            (t("legacy"), PrivilegeSet::from([Privilege::Select])),
        ]
        .into_iter()
        .collect();
        let default = PrivilegeSet::from([Privilege::Select]);

        let desired =
            GrantMatrix::with_table_membership(&current, [t("orders"), t("invoices")], &default);

        assert_eq!(
            desired.get(&t("orders")),
            Some(&PrivilegeSet::from([Privilege::Select, Privilege::Insert]))
        );
        assert_eq!(desired.get(&t("invoices")), Some(&default));
        assert!(!desired.contains_table(&t("legacy")));
    }

    #[test]
    fn single_table_edit_with_empty_set_removes_table() {
        let current: CurrentState = [
            (t("orders"), PrivilegeSet::from([Privilege::Select])),
            (t("movies"), PrivilegeSet::from([Privilege::Select])),
        ]
        .into_iter()
        .collect();

        let desired = GrantMatrix::with_table_privileges(&current, t("orders"), PrivilegeSet::new());
        assert_eq!(desired.len(), 1);
        assert!(desired.contains_table(&t("movies")));
    }
}
