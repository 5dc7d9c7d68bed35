//! Shared dependencies injected into domain actions.

use std::sync::Arc;

use docstore::{DocumentStore, MemoryStore, RetryPolicy};

use crate::config::Config;

/// Dependencies handed to every domain action: the document store and the
/// transaction retry budget. Cloning is cheap; clones share the store.
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn DocumentStore>,
    pub retry: RetryPolicy,
}

impl ServerDeps {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self {
            store,
            retry: config.retry_policy(),
        }
    }

    /// In-process deps for tests and local development.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            retry: RetryPolicy::default(),
        }
    }
}
