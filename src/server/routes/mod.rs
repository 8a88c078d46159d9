pub mod auth;
pub mod catalog;
pub mod console;
pub mod dashboard;
pub mod roles;
pub mod users;
