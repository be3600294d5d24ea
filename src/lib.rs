pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod query;
pub mod repo;
pub mod routes;

// Re-export commonly used items for tests / the binaries
pub use routes::{config, AppState};
