//! Single accept/reject decision under the capacity constraint.

use docstore::{run_transaction, StoreError, TxAbort, TxError};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::common::ApplicationId;
use crate::domains::applications::models::application::{Application, ApplicationStatus};
use crate::domains::opportunities::models::opportunity::{Opportunity, OpportunityStatus};
use crate::kernel::ServerDeps;

/// The decision a provider makes on one pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Error, Debug)]
pub enum DecisionError {
    /// A concurrent actor decided this application first. Terminal, never
    /// retried.
    #[error("this request was already handled")]
    AlreadyDecided,

    /// An accept was attempted with no remaining slots. Terminal, never
    /// retried, nothing written.
    #[error("this opportunity is full")]
    CapacityExceeded,

    #[error("application not found")]
    ApplicationNotFound,

    #[error("opportunity no longer exists")]
    OpportunityNotFound,

    /// Transient write conflicts exceeded the retry budget. Safe to retry
    /// manually: the transaction recomputes everything from scratch.
    #[error("could not commit the decision, please try again")]
    ConflictRetryExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TxError<DecisionError>> for DecisionError {
    fn from(err: TxError<DecisionError>) -> Self {
        match err {
            TxError::Aborted(abort) => abort,
            TxError::RetriesExhausted { .. } => DecisionError::ConflictRetryExhausted,
            TxError::Store(store) => DecisionError::Store(store),
        }
    }
}

/// Decide one pending application.
///
/// Runs as a single optimistic store transaction: the application status
/// and the opportunity's `capacity_filled`/`status` change together or
/// not at all. A concurrent commit against either document forces a
/// rerun, so the capacity check always sees the latest committed value.
pub async fn decide_application(
    deps: &ServerDeps,
    application_id: ApplicationId,
    decision: Decision,
) -> Result<(), DecisionError> {
    let store = deps.store.as_ref();
    let app_ref = Application::doc_ref(application_id);

    run_transaction(store, deps.retry, |tx| {
        let app_ref = &app_ref;
        Box::pin(async move {
            let doc = tx
                .get(app_ref)
                .await?
                .ok_or(TxAbort::Abort(DecisionError::ApplicationNotFound))?;
            let application = Application::decode(&doc)?;

            if application.status.is_terminal() {
                return Err(TxAbort::Abort(DecisionError::AlreadyDecided));
            }

            let opp_ref = Opportunity::doc_ref(application.opportunity_id);
            let doc = tx
                .get(&opp_ref)
                .await?
                .ok_or(TxAbort::Abort(DecisionError::OpportunityNotFound))?;
            let opportunity = Opportunity::decode(&doc)?;

            match decision {
                Decision::Reject => {
                    tx.update(
                        app_ref.clone(),
                        json!({ "status": ApplicationStatus::Rejected }),
                    )?;
                }
                Decision::Accept => {
                    if opportunity.is_full() {
                        return Err(TxAbort::Abort(DecisionError::CapacityExceeded));
                    }
                    let filled = opportunity.capacity_filled + 1;
                    tx.update(
                        app_ref.clone(),
                        json!({ "status": ApplicationStatus::Accepted }),
                    )?;
                    if filled == opportunity.capacity_needed {
                        tx.update(
                            opp_ref,
                            json!({
                                "capacity_filled": filled,
                                "status": OpportunityStatus::Closed,
                            }),
                        )?;
                    } else {
                        tx.update(opp_ref, json!({ "capacity_filled": filled }))?;
                    }
                }
            }
            Ok(())
        })
    })
    .await
    .map_err(DecisionError::from)?;

    let verb = match decision {
        Decision::Accept => "accepted",
        Decision::Reject => "rejected",
    };
    info!("Application {} {}", application_id, verb);
    Ok(())
}
