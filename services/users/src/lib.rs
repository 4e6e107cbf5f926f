//! HTTP CRUD service for user records
//!
//! The binary in `main.rs` wires configuration, the PostgreSQL pool and the
//! router together; everything it needs lives in this library so the router
//! can be exercised directly from tests.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Embedded schema migrations for the `users` table
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
