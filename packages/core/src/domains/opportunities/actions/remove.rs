//! Remove an opportunity action

use docstore::{DocumentStore, StoreResult};
use tracing::info;

use crate::common::OpportunityId;
use crate::domains::opportunities::models::opportunity::Opportunity;
use crate::kernel::ServerDeps;

/// Delete an opportunity document.
///
/// Applications referencing it are left in place; the applicant-side
/// reconciliation pass flags them as orphaned and offers removal there.
pub async fn remove_opportunity(
    deps: &ServerDeps,
    opportunity_id: OpportunityId,
) -> StoreResult<()> {
    deps.store
        .delete(&Opportunity::doc_ref(opportunity_id))
        .await?;
    info!("Removed opportunity {}", opportunity_id);
    Ok(())
}
