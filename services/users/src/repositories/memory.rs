//! In-memory user store used by the handler tests

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use common::{
    error::{DatabaseError, DatabaseResult},
    pagination::Page,
};

use super::UserStore;
use crate::models::{CreatedRange, User};

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
    offline: AtomicBool,
    failing: AtomicBool,
    zero_rows: AtomicBool,
}

impl MemoryUserStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            rows: Mutex::new(users),
            ..Self::default()
        }
    }

    /// Make every subsequent `ping` fail as if the database were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make every statement fail after a successful `ping`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `save` and `soft_delete` report that no row was touched, as when
    /// the record disappears between the read and the write.
    pub fn set_zero_rows(&self, zero_rows: bool) {
        self.zero_rows.store(zero_rows, Ordering::SeqCst);
    }

    fn check_statement(&self) -> DatabaseResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query(sqlx::Error::Protocol(
                "statement failed".to_string(),
            )));
        }
        Ok(())
    }

    fn writes_nothing(&self) -> bool {
        self.zero_rows.load(Ordering::SeqCst)
    }

    /// All rows, soft-deleted ones included.
    pub fn snapshot(&self) -> Vec<User> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ping(&self) -> DatabaseResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn insert(&self, user: &User) -> DatabaseResult<u64> {
        self.check_statement()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.id == user.id) {
            return Err(DatabaseError::Query(sqlx::Error::Protocol(format!(
                "duplicate key value violates unique constraint: {}",
                user.id
            ))));
        }
        rows.push(user.clone());
        Ok(1)
    }

    async fn find(&self, id: &str) -> DatabaseResult<Option<User>> {
        self.check_statement()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }

    async fn save(&self, user: &User) -> DatabaseResult<u64> {
        self.check_statement()?;
        if self.writes_nothing() {
            return Ok(0);
        }
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|u| u.id == user.id && u.deleted_at.is_none())
        {
            Some(row) => {
                row.first_name = user.first_name.clone();
                row.last_name = user.last_name.clone();
                row.updated_at = user.updated_at;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn soft_delete(&self, id: &str) -> DatabaseResult<u64> {
        self.check_statement()?;
        if self.writes_nothing() {
            return Ok(0);
        }
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
        {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list(&self, range: CreatedRange, page: Page) -> DatabaseResult<Vec<User>> {
        self.check_statement()?;
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<User> = rows
            .iter()
            .filter(|u| u.deleted_at.is_none() && range.contains(u.created_at))
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }
}
