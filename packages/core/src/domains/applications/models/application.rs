use chrono::{DateTime, Utc};
use docstore::{Direction, DocRef, Document, DocumentStore, Filter, Query, StoreResult, Write};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::common::{ApplicantId, ApplicationId, OpportunityId, OrgId};

/// Collection holding application documents.
pub const COLLECTION: &str = "applications";

/// Application decision state. `Pending` is the only non-terminal state:
/// the decision engines move an application out of it exactly once and it
/// is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

/// One applicant's request to join one opportunity.
///
/// Carries a denormalized snapshot of the opportunity (org, title,
/// service date) taken at apply time, so the record stays displayable
/// after the opportunity itself is deleted.
///
/// The store may hold more than one application for the same
/// (applicant, opportunity) pair - client retries and re-application
/// flows produce them. That is tolerated here and merged away by the
/// reconciliation engine, never prevented at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub opportunity_id: OpportunityId,
    pub applicant_id: ApplicantId,
    pub org_id: OrgId,
    pub org_name: String,
    pub opportunity_title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub service_date: DateTime<Utc>,
    pub status: ApplicationStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub applied_at: DateTime<Utc>,
}

impl Application {
    pub fn doc_ref(id: ApplicationId) -> DocRef {
        DocRef::new(COLLECTION, id.to_string())
    }

    pub fn decode(doc: &Document) -> StoreResult<Self> {
        doc.decode()
    }

    /// Fetch one application; `Ok(None)` when it does not exist.
    pub async fn fetch(
        store: &dyn DocumentStore,
        id: ApplicationId,
    ) -> StoreResult<Option<Self>> {
        match store.get(&Self::doc_ref(id)).await? {
            Some(doc) => Ok(Some(Self::decode(&doc)?)),
            None => Ok(None),
        }
    }

    /// The subscription/query key for one applicant's full application
    /// set, newest first. Duplicates and dangling opportunity references
    /// are possible in the result; reconciliation cleans them up.
    pub fn query_for_applicant(applicant_id: ApplicantId) -> Query {
        Query::collection(COLLECTION)
            .filter(Filter::eq("applicant_id", json!(applicant_id)))
            .order_by("applied_at", Direction::Descending)
    }

    /// Every application one applicant has on file.
    pub async fn for_applicant(
        store: &dyn DocumentStore,
        applicant_id: ApplicantId,
    ) -> StoreResult<Vec<Self>> {
        let docs = store.query(Self::query_for_applicant(applicant_id)).await?;
        Ok(decode_all(&docs))
    }

    /// Pending applications for one opportunity, oldest first. This is
    /// the canonical candidate order for bulk acceptance:
    /// first-come-first-served.
    pub async fn pending_for_opportunity(
        store: &dyn DocumentStore,
        opportunity_id: OpportunityId,
    ) -> StoreResult<Vec<Self>> {
        let docs = store
            .query(
                Query::collection(COLLECTION)
                    .filter(Filter::eq("opportunity_id", json!(opportunity_id)))
                    .filter(Filter::eq("status", json!(ApplicationStatus::Pending)))
                    .order_by("applied_at", Direction::Ascending),
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
pub(crate) fn decode_all(docs: &[Document]) -> Vec<Application> {
    docs.iter()
        .filter_map(|doc| match Application::decode(doc) {
            Ok(application) => Some(application),
            Err(err) => {
                warn!("Skipping malformed application document: {}", err);
                None
            }
        })
        .collect()
}
