//! Submit an application action

use chrono::Utc;
use docstore::StoreError;
use thiserror::Error;
use tracing::info;

use crate::common::{ApplicantId, ApplicationId, OpportunityId};
use crate::domains::applications::models::application::{Application, ApplicationStatus};
use crate::domains::opportunities::models::opportunity::{Opportunity, OpportunityStatus};
use crate::kernel::ServerDeps;

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("opportunity no longer exists")]
    OpportunityNotFound,

    #[error("this opportunity is no longer accepting applications")]
    OpportunityClosed,

    #[error("this opportunity's service date has passed")]
    OpportunityPassed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create a `Pending` application carrying the opportunity snapshot
/// (org, title, service date) so the record stays displayable even after
/// the opportunity is deleted.
///
/// Uniqueness per (applicant, opportunity) is deliberately NOT enforced:
/// a client retry or re-application flow can produce a duplicate record,
/// which the reconciliation engine later merges in the applicant's view.
pub async fn submit_application(
    deps: &ServerDeps,
    applicant_id: ApplicantId,
    opportunity_id: OpportunityId,
) -> Result<Application, ApplyError> {
    let store = deps.store.as_ref();
    let opportunity = Opportunity::fetch(store, opportunity_id)
        .await?
        .ok_or(ApplyError::OpportunityNotFound)?;

    if opportunity.status == OpportunityStatus::Closed {
        return Err(ApplyError::OpportunityClosed);
    }
    if opportunity.service_date <= Utc::now() {
        return Err(ApplyError::OpportunityPassed);
    }

    let application = Application {
        id: ApplicationId::new(),
        opportunity_id,
        applicant_id,
        org_id: opportunity.org_id,
        org_name: opportunity.org_name,
        opportunity_title: opportunity.title,
        service_date: opportunity.service_date,
        status: ApplicationStatus::Pending,
        applied_at: Utc::now(),
    };
    application.insert(store).await?;

    info!(
        "Applicant {} applied to opportunity {}",
        applicant_id, opportunity_id
    );
    Ok(application)
}
