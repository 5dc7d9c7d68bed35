// Document-store boundary for the volunteer platform core.
//
// The domain engines coordinate exclusively through this contract:
// per-document optimistic transactions, atomic multi-document batch
// writes, filtered queries, and change-notification subscriptions that
// push the full matching set. `MemoryStore` is the in-process
// implementation backing tests and local development.

pub mod document;
pub mod error;
pub mod memory;
pub mod query;
pub mod store;
pub mod tx;

pub use document::{DocRef, Document, Precondition, VersionedDocument, Write};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, Query};
pub use store::{DocumentStore, SnapshotStream};
pub use tx::{run_transaction, RetryPolicy, Transaction, TxAbort, TxError};
