//! One reconciliation pass: fetch, dedupe, look up, build views.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use docstore::{DocumentStore, StoreResult};
use tracing::warn;

use crate::common::ApplicantId;
use crate::domains::applications::models::application::Application;
use crate::domains::applications::reconcile::dedupe::dedupe_applications;
use crate::domains::applications::reconcile::views::{
    build_views, ApplicationViews, OpportunityLookup,
};
use crate::domains::opportunities::models::opportunity::Opportunity;

/// Reconcile one applicant's full application set against current store
/// state.
pub async fn reconcile_applications(
    store: &dyn DocumentStore,
    applicant_id: ApplicantId,
    now: DateTime<Utc>,
) -> StoreResult<ApplicationViews> {
    let applications = Application::for_applicant(store, applicant_id).await?;
    Ok(reconcile_snapshot(store, applications, now).await)
}

/// Reconcile an already-fetched snapshot (the push-driven path).
///
/// Orphan-check lookups happen once per surviving opportunity reference.
/// A failed lookup downgrades to [`OpportunityLookup::Unknown`] instead
/// of failing the pass: the orphan flag stays unset and the next
/// notification retries.
pub async fn reconcile_snapshot(
    store: &dyn DocumentStore,
    applications: Vec<Application>,
    now: DateTime<Utc>,
) -> ApplicationViews {
    let deduped = dedupe_applications(applications);

    let mut lookups = HashMap::new();
    for application in &deduped {
        let lookup = match Opportunity::fetch(store, application.opportunity_id).await {
            Ok(Some(opportunity)) => OpportunityLookup::Found(opportunity),
            Ok(None) => OpportunityLookup::Missing,
            Err(err) => {
                warn!(
                    "Opportunity {} lookup failed, deferring orphan check: {}",
                    application.opportunity_id, err
                );
                OpportunityLookup::Unknown
            }
        };
        lookups.insert(application.opportunity_id, lookup);
    }

    build_views(deduped, &lookups, now)
}
