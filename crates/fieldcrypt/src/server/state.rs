//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::dek::{DerivedKeySource, KeyManager, ManagerOptions};

/// Application state shared across all request handlers.
///
/// [`KeyManager`] is `Arc`-backed, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub keys: KeyManager,
}

impl AppState {
    pub fn new(keys: KeyManager) -> Self {
        Self { keys }
    }
}

impl Default for AppState {
    /// State backed by the default derived key, suitable for tests.
    fn default() -> Self {
        Self::new(KeyManager::new(
            Arc::new(DerivedKeySource::new(None)),
            ManagerOptions::default(),
        ))
    }
}
