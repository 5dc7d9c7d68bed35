//! Post a new opportunity action

use chrono::{DateTime, Utc};
use docstore::StoreError;
use thiserror::Error;
use tracing::info;

use crate::common::{OpportunityId, OrgId};
use crate::domains::opportunities::models::opportunity::{Opportunity, OpportunityStatus};
use crate::kernel::ServerDeps;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("an opportunity needs at least one volunteer slot")]
    ZeroCapacity,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for posting a new opportunity.
#[derive(Debug, Clone)]
pub struct NewOpportunity {
    pub org_id: OrgId,
    pub org_name: String,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub contact_number: Option<String>,
    pub capacity_needed: u32,
    pub service_date: DateTime<Utc>,
}

/// Create an `Active` opportunity with an empty roster.
///
/// `capacity_needed` is immutable after this point; the decision engines
/// own `capacity_filled` and `status` from here on.
pub async fn post_opportunity(
    deps: &ServerDeps,
    new: NewOpportunity,
) -> Result<Opportunity, PostError> {
    if new.capacity_needed == 0 {
        return Err(PostError::ZeroCapacity);
    }

    let opportunity = Opportunity {
        id: OpportunityId::new(),
        org_id: new.org_id,
        org_name: new.org_name,
        title: new.title,
        description: new.description,
        requirements: new.requirements,
        contact_number: new.contact_number,
        capacity_needed: new.capacity_needed,
        capacity_filled: 0,
        status: OpportunityStatus::Active,
        service_date: new.service_date,
        created_at: Utc::now(),
    };
    opportunity.insert(deps.store.as_ref()).await?;

    info!(
        "Posted opportunity {} ({} slots): {}",
        opportunity.id, opportunity.capacity_needed, opportunity.title
    );
    Ok(opportunity)
}
