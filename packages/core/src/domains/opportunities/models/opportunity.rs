use chrono::{DateTime, Utc};
use docstore::{DocRef, Document, DocumentStore, Filter, Query, StoreResult, Write};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::common::{OpportunityId, OrgId};

/// Collection holding opportunity documents.
pub const COLLECTION: &str = "opportunities";

/// Opportunity lifecycle state. `Closed` is reached when the roster
/// fills; nothing in this core reopens a closed opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityStatus {
    Active,
    Closed,
}

/// A capacity-limited volunteer opportunity.
///
/// `capacity_filled` and `status` are the only shared mutable state in
/// the platform; they change exclusively inside the decision engines'
/// store transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub org_id: OrgId,
    pub org_name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,

    /// Volunteers wanted; positive and immutable after posting.
    pub capacity_needed: u32,
    /// Volunteers accepted so far; never exceeds `capacity_needed`.
    pub capacity_filled: u32,
    pub status: OpportunityStatus,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub service_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Opportunity {
    pub fn doc_ref(id: OpportunityId) -> DocRef {
        DocRef::new(COLLECTION, id.to_string())
    }

    pub fn remaining(&self) -> u32 {
        self.capacity_needed.saturating_sub(self.capacity_filled)
    }

    pub fn is_full(&self) -> bool {
        self.capacity_filled >= self.capacity_needed
    }

    pub fn decode(doc: &Document) -> StoreResult<Self> {
        doc.decode()
    }

    /// Fetch one opportunity; `Ok(None)` when it has been deleted.
    pub async fn fetch(
        store: &dyn DocumentStore,
        id: OpportunityId,
    ) -> StoreResult<Option<Self>> {
        match store.get(&Self::doc_ref(id)).await? {
            Some(doc) => Ok(Some(Self::decode(&doc)?)),
            None => Ok(None),
        }
    }

    /// All opportunities posted by one organization, newest first.
    pub async fn for_org(store: &dyn DocumentStore, org_id: OrgId) -> StoreResult<Vec<Self>> {
        let docs = store
            .query(
                Query::collection(COLLECTION)
                    .filter(Filter::eq("org_id", json!(org_id)))
                    .order_by("created_at", docstore::Direction::Descending),
            )
            .await?;
        Ok(decode_all(&docs))
    }

    pub async fn insert(&self, store: &dyn DocumentStore) -> StoreResult<()> {
        store
            .batch_write(vec![Write::set(Self::doc_ref(self.id), self)?])
            .await
    }
}

/// Decode query results, skipping documents that no longer parse.
pub(crate) fn decode_all(docs: &[Document]) -> Vec<Opportunity> {
    docs.iter()
        .filter_map(|doc| match Opportunity::decode(doc) {
            Ok(opportunity) => Some(opportunity),
            Err(err) => {
                warn!("Skipping malformed opportunity document: {}", err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Millisecond-aligned timestamps, since documents carry epoch millis.
    fn aligned(at: DateTime<Utc>) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap()
    }

    fn sample(needed: u32, filled: u32) -> Opportunity {
        Opportunity {
            id: OpportunityId::new(),
            org_id: OrgId::new(),
            org_name: "Harvest Food Shelf".to_string(),
            title: "Weekend packing shift".to_string(),
            description: "Pack weekend food boxes".to_string(),
            requirements: None,
            contact_number: None,
            capacity_needed: needed,
            capacity_filled: filled,
            status: OpportunityStatus::Active,
            service_date: aligned(Utc::now() + Duration::days(7)),
            created_at: aligned(Utc::now()),
        }
    }

    #[test]
    fn test_remaining_and_full() {
        let opportunity = sample(3, 2);
        assert_eq!(opportunity.remaining(), 1);
        assert!(!opportunity.is_full());
        assert!(sample(2, 2).is_full());
        // A document that somehow over-filled still reports zero remaining.
        assert_eq!(sample(2, 3).remaining(), 0);
    }

    #[test]
    fn test_status_serializes_as_plain_names() {
        assert_eq!(json!(OpportunityStatus::Active), json!("Active"));
        assert_eq!(json!(OpportunityStatus::Closed), json!("Closed"));
    }

    #[test]
    fn test_document_roundtrip() {
        let opportunity = sample(4, 1);
        let doc =
            Document::encode(Opportunity::doc_ref(opportunity.id), &opportunity).unwrap();
        // Timestamps travel as epoch millis.
        assert!(doc.field("service_date").unwrap().is_i64());
        assert_eq!(Opportunity::decode(&doc).unwrap(), opportunity);
    }
}
