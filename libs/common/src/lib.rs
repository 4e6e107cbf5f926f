//! Common library for the user records service
//!
//! This crate provides the database plumbing shared by the service crates:
//! PostgreSQL configuration, connection pooling, liveness checks, pagination
//! and the error type used across them.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config)?;
//!     health_check(&pool).await?;
//!     println!("Database is reachable");
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod pagination;
