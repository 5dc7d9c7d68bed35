//! Change propagation: store subscriptions to reconciled views.
//!
//! No business logic lives here. Each store push delivers the full
//! current document set for the subscribed key; this layer decodes it,
//! hands it to the reconciliation engine, and republishes the resulting
//! views whole. Consumers are idempotent re-renderers of the latest
//! value.

use std::sync::Arc;

use chrono::Utc;
use docstore::{DocumentStore, Filter, Query, StoreResult};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::common::{ApplicantId, OpportunityId};
use crate::domains::applications::models::application::{self, Application};
use crate::domains::applications::reconcile::engine::reconcile_snapshot;
use crate::domains::applications::reconcile::views::ApplicationViews;
use crate::domains::opportunities::models::opportunity::{self, Opportunity};

/// Live reconciled views for one applicant, keyed by their id.
///
/// Holds a background task that runs a reconciliation pass on every
/// store push; dropping the feed stops it.
pub struct ApplicationFeed {
    rx: watch::Receiver<ApplicationViews>,
    task: JoinHandle<()>,
}

impl ApplicationFeed {
    /// Subscribe to an applicant's application set and keep their
    /// reconciled views current.
    pub async fn start(
        store: Arc<dyn DocumentStore>,
        applicant_id: ApplicantId,
    ) -> StoreResult<Self> {
        let mut snapshots = store
            .subscribe(Application::query_for_applicant(applicant_id))
            .await?;
        let (tx, rx) = watch::channel(ApplicationViews::default());

        let task = tokio::spawn(async move {
            while let Some(docs) = snapshots.next().await {
                let applications = application::decode_all(&docs);
                let views =
                    reconcile_snapshot(store.as_ref(), applications, Utc::now()).await;
                if tx.send(views).is_err() {
                    break;
                }
            }
        });

        Ok(Self { rx, task })
    }

    /// A receiver of the latest views; `changed()` awaits the next pass.
    pub fn views(&self) -> watch::Receiver<ApplicationViews> {
        self.rx.clone()
    }

    /// The most recent reconciled views.
    pub fn latest(&self) -> ApplicationViews {
        self.rx.borrow().clone()
    }
}

impl Drop for ApplicationFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch one opportunity document for a detail view. Yields the current
/// document immediately, then again after every committed change;
/// `None` means the opportunity no longer exists.
pub async fn watch_opportunity(
    store: &dyn DocumentStore,
    opportunity_id: OpportunityId,
) -> StoreResult<BoxStream<'static, Option<Opportunity>>> {
    let snapshots = store
        .subscribe(
            Query::collection(opportunity::COLLECTION)
                .filter(Filter::eq("id", json!(opportunity_id))),
        )
        .await?;

    Ok(snapshots
        .map(|docs| {
            docs.first().and_then(|doc| match Opportunity::decode(doc) {
                Ok(opportunity) => Some(opportunity),
                Err(err) => {
                    warn!("Skipping malformed opportunity document: {}", err);
                    None
                }
            })
        })
        .boxed())
}
