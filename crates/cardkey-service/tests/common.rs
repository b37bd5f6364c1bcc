//! Common test utilities for card key service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use cardkey_service::{create_router, AppState, ServiceConfig};
use cardkey_store::MemoryStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The backing store, for inspecting state directly.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new test harness with an empty store and default config.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a new test harness with the given config.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Generate keys and return them.
    pub async fn generate(&self, body: Value) -> Vec<String> {
        let response = self.server.post("/api/cards").json(&body).await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["keys"]
            .as_array()
            .expect("keys array")
            .iter()
            .map(|k| k.as_str().expect("key string").to_string())
            .collect()
    }

    /// Generate a single default key.
    pub async fn generate_one(&self) -> String {
        self.generate(json!({ "count": 1 }))
            .await
            .pop()
            .expect("one key")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Service config suitable for tests.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        data_dir: String::new(),
        max_batch_size: 50,
        ..ServiceConfig::default()
    }
}
