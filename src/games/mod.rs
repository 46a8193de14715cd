pub mod repo;
pub mod repo_types;
pub mod seed;

pub use repo_types::{CategoryCount, GameMetrics, NewGame};
