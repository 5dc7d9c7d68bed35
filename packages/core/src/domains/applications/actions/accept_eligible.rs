//! Bulk acceptance: accept as many eligible pending applications as
//! remaining capacity allows, in one atomic commit.

use docstore::{run_transaction, StoreError, TxAbort, TxError};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::common::{ApplicationId, OpportunityId};
use crate::domains::applications::models::application::{Application, ApplicationStatus};
use crate::domains::opportunities::models::opportunity::{Opportunity, OpportunityStatus};
use crate::kernel::ServerDeps;

/// Outcome of one bulk acceptance pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The selected candidates were accepted. `applications` preserves the
    /// caller's candidate order and may be empty when every candidate had
    /// already been decided elsewhere.
    Accepted {
        applications: Vec<ApplicationId>,
        closed: bool,
    },
    /// No remaining slots before selection started. Nothing was written;
    /// this is a no-op outcome, not an error.
    CapacityAlreadyFull,
}

#[derive(Error, Debug)]
pub enum BulkAcceptError {
    #[error("opportunity no longer exists")]
    OpportunityNotFound,

    #[error("could not commit bulk acceptance, please try again")]
    ConflictRetryExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TxError<BulkAcceptError>> for BulkAcceptError {
    fn from(err: TxError<BulkAcceptError>) -> Self {
        match err {
            TxError::Aborted(abort) => abort,
            TxError::RetriesExhausted { .. } => BulkAcceptError::ConflictRetryExhausted,
            TxError::Store(store) => BulkAcceptError::Store(store),
        }
    }
}

/// Accept the longest still-pending prefix of `candidates` that fits the
/// opportunity's remaining capacity.
///
/// Candidate ordering is the caller's policy; the canonical feed is
/// [`Application::pending_for_opportunity`], which orders by `applied_at`
/// ascending (first-come-first-served).
///
/// The capacity read, the per-candidate pending checks, and all writes
/// run inside one optimistic transaction, so a concurrent single accept
/// forces a replan instead of an overshoot, and a candidate decided
/// elsewhere is skipped instead of overwritten. Either every selected
/// application is accepted and the capacity adjusted, or nothing is.
pub async fn accept_eligible(
    deps: &ServerDeps,
    opportunity_id: OpportunityId,
    candidates: &[Application],
) -> Result<BulkOutcome, BulkAcceptError> {
    let store = deps.store.as_ref();
    let opp_ref = Opportunity::doc_ref(opportunity_id);

    let outcome = run_transaction(store, deps.retry, |tx| {
        let opp_ref = &opp_ref;
        Box::pin(async move {
            let doc = tx
                .get(opp_ref)
                .await?
                .ok_or(TxAbort::Abort(BulkAcceptError::OpportunityNotFound))?;
            let opportunity = Opportunity::decode(&doc)?;

            let remaining = opportunity.remaining() as usize;
            if remaining == 0 {
                return Ok(BulkOutcome::CapacityAlreadyFull);
            }

            let mut selected = Vec::new();
            for candidate in candidates {
                if selected.len() == remaining {
                    break;
                }
                let app_ref = Application::doc_ref(candidate.id);
                let Some(doc) = tx.get(&app_ref).await? else {
                    // Withdrawn since the caller listed it.
                    continue;
                };
                let current = Application::decode(&doc)?;
                if current.status != ApplicationStatus::Pending {
                    continue;
                }
                tx.update(app_ref, json!({ "status": ApplicationStatus::Accepted }))?;
                selected.push(current.id);
            }

            let filled = opportunity.capacity_filled + selected.len() as u32;
            let closed = filled == opportunity.capacity_needed;
            if !selected.is_empty() {
                if closed {
                    tx.update(
                        opp_ref.clone(),
                        json!({
                            "capacity_filled": filled,
                            "status": OpportunityStatus::Closed,
                        }),
                    )?;
                } else {
                    tx.update(opp_ref.clone(), json!({ "capacity_filled": filled }))?;
                }
            }
            Ok(BulkOutcome::Accepted {
                applications: selected,
                closed,
            })
        })
    })
    .await
    .map_err(BulkAcceptError::from)?;

    match &outcome {
        BulkOutcome::Accepted { applications, .. } => {
            info!(
                "Bulk-accepted {} applicant(s) for opportunity {}",
                applications.len(),
                opportunity_id
            );
        }
        BulkOutcome::CapacityAlreadyFull => {
            info!(
                "Bulk accept skipped: opportunity {} is already full",
                opportunity_id
            );
        }
    }
    Ok(outcome)
}
