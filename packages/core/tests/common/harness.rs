//! Test harness: in-memory document store plus injected deps.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docstore::{
    DocRef, Document, DocumentStore, MemoryStore, Precondition, Query, RetryPolicy,
    SnapshotStream, StoreError, StoreResult, VersionedDocument, Write,
};
use mnvolunteer_core::kernel::ServerDeps;
use test_context::AsyncTestContext;

/// Initialize the test tracing subscriber once; respects RUST_LOG when
/// tests run with --nocapture.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deps wired to an arbitrary store (e.g. a [`FlakyStore`]), with a
/// generous retry budget so contention tests never exhaust retries.
pub fn deps_for(store: Arc<dyn DocumentStore>) -> ServerDeps {
    init_tracing();
    ServerDeps {
        store,
        retry: RetryPolicy::attempts(32),
    }
}

pub struct TestHarness {
    pub store: MemoryStore,
    pub deps: ServerDeps,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let deps = deps_for(Arc::new(store.clone()));
        Self { store, deps }
    }
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // The in-memory store drops with the harness.
    }
}

/// Store wrapper that fails a scripted number of reads before delegating,
/// for exercising transient-failure paths. Writes always pass through.
pub struct FlakyStore {
    inner: MemoryStore,
    failing_reads: Mutex<u32>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing_reads: Mutex::new(0),
        }
    }

    /// Make the next `count` reads fail with `StoreError::Unavailable`.
    pub fn fail_reads(&self, count: u32) {
        *self.failing_reads.lock().unwrap() = count;
    }

    fn take_failure(&self) -> bool {
        let mut remaining = self.failing_reads.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, doc: &DocRef) -> StoreResult<Option<Document>> {
        if self.take_failure() {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        self.inner.get(doc).await
    }

    async fn get_versioned(&self, doc: &DocRef) -> StoreResult<Option<VersionedDocument>> {
        if self.take_failure() {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        self.inner.get_versioned(doc).await
    }

    async fn query(&self, query: Query) -> StoreResult<Vec<Document>> {
        self.inner.query(query).await
    }

    async fn commit(
        &self,
        preconditions: Vec<Precondition>,
        writes: Vec<Write>,
    ) -> StoreResult<()> {
        self.inner.commit(preconditions, writes).await
    }

    async fn delete(&self, doc: &DocRef) -> StoreResult<()> {
        self.inner.delete(doc).await
    }

    async fn subscribe(&self, query: Query) -> StoreResult<SnapshotStream> {
        self.inner.subscribe(query).await
    }
}
