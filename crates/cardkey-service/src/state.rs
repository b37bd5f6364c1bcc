//! Application state.

use std::sync::Arc;

use cardkey_store::{CardKeyLifecycle, Store};

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The lifecycle manager; the only path to the store.
    pub lifecycle: CardKeyLifecycle,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self {
            lifecycle: CardKeyLifecycle::new(store),
            config,
        }
    }
}
