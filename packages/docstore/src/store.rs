//! The persistent-store contract the domain engines depend on.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::document::{DocRef, Document, Precondition, VersionedDocument, Write};
use crate::error::StoreResult;
use crate::query::Query;

/// Stream of full matching snapshots: every item is the complete current
/// set of documents matching the subscribed query, not a diff. Consumers
/// are expected to be idempotent re-renderers of that set.
pub type SnapshotStream = BoxStream<'static, Vec<Document>>;

/// A document database offering per-document atomic transactions
/// (via versioned reads and conditional commits), atomic multi-document
/// batch writes, filtered queries, and change-notification subscriptions.
///
/// Optimistic transactions are built on top of this trait by
/// [`crate::tx::run_transaction`]; nothing else in the platform mutates
/// shared state outside a `commit`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document. `Ok(None)` when it does not exist.
    async fn get(&self, doc: &DocRef) -> StoreResult<Option<Document>>;

    /// Optimistic read: the document plus the version a conditional
    /// commit can validate against.
    async fn get_versioned(&self, doc: &DocRef) -> StoreResult<Option<VersionedDocument>>;

    /// Run a filtered query against one collection.
    async fn query(&self, query: Query) -> StoreResult<Vec<Document>>;

    /// All-or-nothing conditional commit: every precondition is validated
    /// and every write applied atomically, or nothing happens and
    /// `StoreError::Conflict` is returned for a stale precondition.
    async fn commit(&self, preconditions: Vec<Precondition>, writes: Vec<Write>)
        -> StoreResult<()>;

    /// Atomic batch write without read preconditions.
    async fn batch_write(&self, writes: Vec<Write>) -> StoreResult<()> {
        self.commit(Vec::new(), writes).await
    }

    /// Delete one document directly (a no-op when already absent).
    async fn delete(&self, doc: &DocRef) -> StoreResult<()>;

    /// Subscribe to a query. The stream yields the current matching set
    /// immediately, then again after every committed change that touches
    /// the collection.
    async fn subscribe(&self, query: Query) -> StoreResult<SnapshotStream>;
}
