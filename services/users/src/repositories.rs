//! Repositories for database operations

use async_trait::async_trait;
use chrono::Utc;
use common::{
    database::health_check,
    error::{DatabaseError, DatabaseResult},
    pagination::Page,
};
use sqlx::PgPool;
use tracing::debug;

use crate::models::{CreatedRange, User};

#[cfg(test)]
pub mod memory;

/// Storage used by the user handlers
///
/// Every read and write ignores soft-deleted rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Liveness check run before a request touches the store.
    async fn ping(&self) -> DatabaseResult<()>;

    /// Insert a new record. Returns the number of rows written.
    async fn insert(&self, user: &User) -> DatabaseResult<u64>;

    /// Find a live record by identifier.
    async fn find(&self, id: &str) -> DatabaseResult<Option<User>>;

    /// Persist the names and update time of a live record. Returns the number
    /// of rows affected.
    async fn save(&self, user: &User) -> DatabaseResult<u64>;

    /// Mark a live record as deleted. Returns the number of rows affected.
    async fn soft_delete(&self, id: &str) -> DatabaseResult<u64>;

    /// Live records created within `range`, oldest first (ties by id), one
    /// page at a time.
    async fn list(&self, range: CreatedRange, page: Page) -> DatabaseResult<Vec<User>>;
}

/// User repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn ping(&self) -> DatabaseResult<()> {
        health_check(&self.pool).await
    }

    async fn insert(&self, user: &User) -> DatabaseResult<u64> {
        debug!("Inserting user {}", user.id);

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected())
    }

    async fn find(&self, id: &str) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn save(&self, user: &User) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected())
    }

    async fn soft_delete(&self, id: &str) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected())
    }

    async fn list(&self, range: CreatedRange, page: Page) -> DatabaseResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL AND created_at >= $1 AND created_at <= $2
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(range.earliest)
        .bind(range.latest)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
