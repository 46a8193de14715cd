pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo_types::{role_icon, role_label, ActiveCounts, Activity, Role, RoleCount, User};
