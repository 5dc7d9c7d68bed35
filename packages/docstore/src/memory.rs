//! In-process document store.
//!
//! Backs the platform's tests and local development. Commits serialize
//! through a single mutex, optimistic transactions detect concurrent
//! commits through per-document versions, and subscriptions are watch
//! channels that recompute the full matching set after every committed
//! mutation. The mutex is never held across an await point.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::trace;

use crate::document::{DocRef, Document, Precondition, VersionedDocument, Write};
use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::store::{DocumentStore, SnapshotStream};

#[derive(Debug, Clone)]
struct StoredDoc {
    data: Value,
    version: u64,
}

struct Watcher {
    query: Query,
    tx: watch::Sender<Vec<Document>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, HashMap<String, StoredDoc>>,
    watchers: Vec<Watcher>,
    next_version: u64,
}

impl Inner {
    fn lookup(&self, doc: &DocRef) -> Option<&StoredDoc> {
        self.collections.get(&doc.collection)?.get(&doc.id)
    }

    fn current_version(&self, doc: &DocRef) -> Option<u64> {
        self.lookup(doc).map(|d| d.version)
    }

    fn matching(&self, query: &Query) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .collections
            .get(&query.collection)
            .map(|collection| {
                collection
                    .iter()
                    .map(|(id, stored)| Document {
                        doc_ref: DocRef::new(query.collection.clone(), id.clone()),
                        data: stored.data.clone(),
                    })
                    .filter(|doc| query.matches(doc))
                    .collect()
            })
            .unwrap_or_default();
        query.sort(&mut docs);
        docs
    }

    /// Validate preconditions and update targets, then apply every write
    /// under one freshly allocated version. Returns the touched
    /// collections for watcher notification.
    fn commit(
        &mut self,
        preconditions: &[Precondition],
        writes: &[Write],
    ) -> StoreResult<HashSet<String>> {
        for pre in preconditions {
            if self.current_version(&pre.doc) != pre.expected {
                return Err(StoreError::Conflict(pre.doc.to_string()));
            }
        }
        for write in writes {
            if let Write::Update { doc, .. } = write {
                if self.lookup(doc).is_none() {
                    return Err(StoreError::NotFound(doc.to_string()));
                }
            }
        }

        self.next_version += 1;
        let version = self.next_version;
        let mut touched = HashSet::new();
        for write in writes {
            touched.insert(write.doc_ref().collection.clone());
            match write {
                Write::Set { doc, data } => {
                    self.collections.entry(doc.collection.clone()).or_default().insert(
                        doc.id.clone(),
                        StoredDoc {
                            data: data.clone(),
                            version,
                        },
                    );
                }
                Write::Update { doc, fields } => {
                    // Existence was checked above; top-level fields merge in.
                    let stored = self
                        .collections
                        .get_mut(&doc.collection)
                        .and_then(|c| c.get_mut(&doc.id))
                        .expect("update target verified before apply");
                    if let Value::Object(data) = &mut stored.data {
                        for (key, value) in fields {
                            data.insert(key.clone(), value.clone());
                        }
                    }
                    stored.version = version;
                }
                Write::Delete { doc } => {
                    if let Some(collection) = self.collections.get_mut(&doc.collection) {
                        collection.remove(&doc.id);
                    }
                }
            }
        }
        Ok(touched)
    }

    /// Push fresh snapshots to every live watcher of a touched collection.
    fn notify(&mut self, touched: &HashSet<String>) {
        let watchers = std::mem::take(&mut self.watchers);
        let mut kept = Vec::with_capacity(watchers.len());
        for watcher in watchers {
            if watcher.tx.is_closed() {
                continue;
            }
            if touched.contains(&watcher.query.collection) {
                let snapshot = self.matching(&watcher.query);
                watcher.tx.send_replace(snapshot);
            }
            kept.push(watcher);
        }
        self.watchers = kept;
    }
}

/// In-process [`DocumentStore`] implementation.
///
/// Cheap to clone; clones share the same underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, doc: &DocRef) -> StoreResult<Option<Document>> {
        Ok(self.lock().lookup(doc).map(|stored| Document {
            doc_ref: doc.clone(),
            data: stored.data.clone(),
        }))
    }

    async fn get_versioned(&self, doc: &DocRef) -> StoreResult<Option<VersionedDocument>> {
        Ok(self.lock().lookup(doc).map(|stored| VersionedDocument {
            document: Document {
                doc_ref: doc.clone(),
                data: stored.data.clone(),
            },
            version: stored.version,
        }))
    }

    async fn query(&self, query: Query) -> StoreResult<Vec<Document>> {
        Ok(self.lock().matching(&query))
    }

    async fn commit(
        &self,
        preconditions: Vec<Precondition>,
        writes: Vec<Write>,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        let touched = inner.commit(&preconditions, &writes)?;
        trace!(
            "committed {} write(s) across {} collection(s)",
            writes.len(),
            touched.len()
        );
        inner.notify(&touched);
        Ok(())
    }

    async fn delete(&self, doc: &DocRef) -> StoreResult<()> {
        self.commit(Vec::new(), vec![Write::delete(doc.clone())]).await
    }

    async fn subscribe(&self, query: Query) -> StoreResult<SnapshotStream> {
        let mut inner = self.lock();
        let initial = inner.matching(&query);
        let (tx, rx) = watch::channel(initial);
        inner.watchers.push(Watcher { query, tx });
        Ok(WatchStream::new(rx).boxed())
    }
}
