use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failures surfaced to the domain engines.
///
/// `Conflict` drives the optimistic retry loop in [`crate::tx`]; the
/// other variants propagate to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A write targeted a document that does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A commit precondition observed a stale version.
    #[error("write conflict on {0}")]
    Conflict(String),

    /// Transient backend failure; no state was mutated.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A document could not be encoded or decoded.
    #[error("codec error for {doc}: {message}")]
    Codec { doc: String, message: String },
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}
