//! Optimistic read-validate-commit transactions.
//!
//! The platform enforces its capacity constraint with store-managed
//! optimistic transactions instead of an application-level lock: the
//! body reads documents through a [`Transaction`] handle (which records
//! the observed versions), buffers writes, and the final conditional
//! commit either applies everything or conflicts and reruns the body.

use futures::future::BoxFuture;
use tracing::debug;

use crate::document::{DocRef, Document, Precondition, Write};
use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

/// Attempt budget for one optimistic transaction.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn attempts(attempts: u32) -> Self {
        Self { attempts }
    }
}

impl Default for RetryPolicy {
    /// Store-default retry budget.
    fn default() -> Self {
        Self { attempts: 5 }
    }
}

/// Why a transaction body stopped: a store failure, or a domain-level
/// abort that must not be retried.
#[derive(Debug)]
pub enum TxAbort<E> {
    Store(StoreError),
    Abort(E),
}

impl<E> From<StoreError> for TxAbort<E> {
    fn from(err: StoreError) -> Self {
        TxAbort::Store(err)
    }
}

/// Terminal result of [`run_transaction`].
#[derive(Debug)]
pub enum TxError<E> {
    /// The body aborted; never retried.
    Aborted(E),
    /// Conflicting commits exhausted the retry budget.
    RetriesExhausted { attempts: u32 },
    /// A non-conflict store failure.
    Store(StoreError),
}

/// Transactional read/write handle passed to the body.
///
/// Every `get` records the observed document version as a commit
/// precondition (including "absent"), so any concurrent commit against a
/// document read here forces this transaction to rerun.
pub struct Transaction<'s> {
    store: &'s dyn DocumentStore,
    preconditions: Vec<Precondition>,
    writes: Vec<Write>,
}

impl<'s> Transaction<'s> {
    fn new(store: &'s dyn DocumentStore) -> Self {
        Self {
            store,
            preconditions: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Transactional read. `Ok(None)` still pins the document: it must
    /// remain absent at commit time.
    pub async fn get(&mut self, doc: &DocRef) -> StoreResult<Option<Document>> {
        match self.store.get_versioned(doc).await? {
            Some(versioned) => {
                self.preconditions
                    .push(Precondition::version(doc.clone(), versioned.version));
                Ok(Some(versioned.document))
            }
            None => {
                self.preconditions.push(Precondition::absent(doc.clone()));
                Ok(None)
            }
        }
    }

    /// Buffer a full-document write.
    pub fn set<T: serde::Serialize>(&mut self, doc: DocRef, value: &T) -> StoreResult<()> {
        self.writes.push(Write::set(doc, value)?);
        Ok(())
    }

    /// Buffer a field-merge write.
    pub fn update(&mut self, doc: DocRef, fields: serde_json::Value) -> StoreResult<()> {
        self.writes.push(Write::update(doc, fields)?);
        Ok(())
    }

    /// Buffer a delete.
    pub fn delete(&mut self, doc: DocRef) {
        self.writes.push(Write::delete(doc));
    }
}

/// Run `body` as one optimistic transaction.
///
/// The body reruns from scratch after every write conflict, up to the
/// policy's attempt budget; it must recompute all state from its own
/// transactional reads. `TxAbort::Abort` is terminal and commits nothing.
pub async fn run_transaction<'s, T, E, F>(
    store: &'s dyn DocumentStore,
    policy: RetryPolicy,
    mut body: F,
) -> Result<T, TxError<E>>
where
    F: for<'t> FnMut(&'t mut Transaction<'s>) -> BoxFuture<'t, Result<T, TxAbort<E>>>,
{
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        let mut tx = Transaction::new(store);
        match body(&mut tx).await {
            Ok(value) => {
                let Transaction {
                    preconditions,
                    writes,
                    ..
                } = tx;
                match store.commit(preconditions, writes).await {
                    Ok(()) => return Ok(value),
                    Err(err) if err.is_conflict() => {
                        debug!("transaction conflict on attempt {attempt}, retrying");
                        continue;
                    }
                    Err(err) => return Err(TxError::Store(err)),
                }
            }
            Err(TxAbort::Abort(abort)) => return Err(TxError::Aborted(abort)),
            Err(TxAbort::Store(err)) if err.is_conflict() => {
                debug!("transactional read conflict on attempt {attempt}, retrying");
                continue;
            }
            Err(TxAbort::Store(err)) => return Err(TxError::Store(err)),
        }
    }
    Err(TxError::RetriesExhausted { attempts })
}
