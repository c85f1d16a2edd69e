use std::sync::Arc;

use crate::log_store::LogStore;

/// Shared by every request handler. The store is the only mutable state.
pub struct AppState {
    pub store: Arc<LogStore>,
}

impl AppState {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }
}
