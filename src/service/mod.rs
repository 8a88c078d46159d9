//! Mutation services. Each public operation owns one transaction.

pub mod auth;
pub mod reconcile;
pub mod users;

pub use reconcile::{GrantEdit, ReconcileOutcome, Reconciler, desired_from_entries};
pub use users::UserChanges;
