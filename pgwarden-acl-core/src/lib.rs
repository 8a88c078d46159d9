pub mod guard;
pub mod ident;
pub mod matrix;
pub mod plan;
pub mod privilege;
pub mod statement;

pub use guard::{CommandGuard, DISALLOWED_VERBS, GuardRejection};
pub use ident::{Identifier, IdentifierError, quote_ident, quote_literal};
pub use matrix::{CurrentState, DesiredState, GrantMatrix};
pub use plan::{PrivilegeDiff, ReconciliationPlan, diff};
pub use privilege::{Privilege, PrivilegeParseError, PrivilegeSet};
pub use statement::{GrantStatement, RoleStatement};
