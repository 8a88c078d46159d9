pub mod auth;
pub mod console;
pub mod dashboard;
pub mod roles;
pub mod schema;
pub mod users;

pub use auth::{LoginRequest, LoginResponse, MessageResponse};
pub use console::{ConsoleRequest, ConsoleResponse, NO_RESULTS_MESSAGE};
pub use dashboard::{DashboardData, RecentActivity};
pub use roles::{
    CreateRoleRequest, PrivilegeInfo, RoleGrants, TablePrivileges, UpdateRolePrivilegesRequest,
    UpdateRoleTablesRequest,
};
pub use schema::{TableColumn, TableSchema};
pub use users::{CreateUserRequest, UpdateUserRequest, UserRoleResponse, UserSummary};
