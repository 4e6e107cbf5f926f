//! Integration tests for the database plumbing
//!
//! These tests need a reachable PostgreSQL instance configured through the
//! `POSTGRES_*` environment variables. Run them with `cargo test -- --ignored`.

use common::database::{DatabaseConfig, health_check, init_pool};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_database_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config)?;

    health_check(&pool).await?;

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    // The session time zone comes from POSTGRES_TIMEZONE.
    if let Some(expected) = db_config.timezone.as_deref() {
        let tz: String = sqlx::query_scalar("SHOW TimeZone").fetch_one(&pool).await?;
        assert_eq!(tz, expected);
    }

    Ok(())
}
