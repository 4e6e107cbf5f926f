//! Application state shared across handlers

use std::sync::Arc;

use crate::repositories::UserStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(users: impl UserStore + 'static) -> Self {
        Self {
            users: Arc::new(users),
        }
    }
}
