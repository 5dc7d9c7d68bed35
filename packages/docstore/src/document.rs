//! Documents, references, and the write/precondition vocabulary.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Reference to one document: collection name plus document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as returned by reads, queries, and subscriptions.
///
/// `data` is a JSON object; field names are the only schema the store
/// knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doc_ref: DocRef,
    pub data: Value,
}

impl Document {
    /// Encode a serializable value as a document.
    pub fn encode<T: Serialize>(doc_ref: DocRef, value: &T) -> StoreResult<Self> {
        let data = serde_json::to_value(value).map_err(|e| StoreError::Codec {
            doc: doc_ref.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { doc_ref, data })
    }

    /// Decode the document into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| StoreError::Codec {
            doc: self.doc_ref.to_string(),
            message: e.to_string(),
        })
    }

    /// Read one top-level field, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// A document together with the store version observed at read time.
///
/// The version is what a conditional commit validates: any committed
/// mutation of the document bumps it.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDocument {
    pub document: Document,
    pub version: u64,
}

/// One write inside an atomic batch or transaction commit.
#[derive(Debug, Clone)]
pub enum Write {
    /// Create or fully replace a document.
    Set { doc: DocRef, data: Value },
    /// Merge top-level fields into an existing document. Fails the whole
    /// commit when the document does not exist.
    Update {
        doc: DocRef,
        fields: Map<String, Value>,
    },
    /// Delete the document (a no-op when already absent).
    Delete { doc: DocRef },
}

impl Write {
    pub fn set<T: Serialize>(doc: DocRef, value: &T) -> StoreResult<Self> {
        let encoded = Document::encode(doc, value)?;
        Ok(Write::Set {
            doc: encoded.doc_ref,
            data: encoded.data,
        })
    }

    /// Build a field-merge write from a JSON object.
    pub fn update(doc: DocRef, fields: Value) -> StoreResult<Self> {
        match fields {
            Value::Object(fields) => Ok(Write::Update { doc, fields }),
            other => Err(StoreError::Codec {
                doc: doc.to_string(),
                message: format!("update patch must be a JSON object, got {other}"),
            }),
        }
    }

    pub fn delete(doc: DocRef) -> Self {
        Write::Delete { doc }
    }

    pub fn doc_ref(&self) -> &DocRef {
        match self {
            Write::Set { doc, .. } | Write::Update { doc, .. } | Write::Delete { doc } => doc,
        }
    }
}

/// Precondition validated atomically at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub doc: DocRef,
    /// Expected current version; `None` means the document must not exist.
    pub expected: Option<u64>,
}

impl Precondition {
    /// The document must still be at `version`.
    pub fn version(doc: DocRef, version: u64) -> Self {
        Self {
            doc,
            expected: Some(version),
        }
    }

    /// The document must still be absent.
    pub fn absent(doc: DocRef) -> Self {
        Self {
            doc,
            expected: None,
        }
    }
}
