pub mod analytics;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod games;
pub mod logging;
pub mod routes;
pub mod schema;
pub mod state;
pub mod users;
