//! Test fixtures for creating lifecycle test data.
//!
//! Fixtures write through the model insert methods, the same path the
//! actions use. Timestamps are millisecond-aligned because documents
//! carry epoch millis.

use chrono::{DateTime, Duration, Utc};
use docstore::DocumentStore;
use mnvolunteer_core::common::{ApplicantId, ApplicationId, OpportunityId, OrgId};
use mnvolunteer_core::domains::applications::models::application::{
    Application, ApplicationStatus,
};
use mnvolunteer_core::domains::opportunities::models::opportunity::{
    Opportunity, OpportunityStatus,
};

/// Millisecond-aligned "now".
pub fn now_ms() -> DateTime<Utc> {
    align(Utc::now())
}

pub fn align(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap()
}

/// Seed an opportunity a week out with the given capacity counters.
pub async fn seed_opportunity(
    store: &dyn DocumentStore,
    capacity_needed: u32,
    capacity_filled: u32,
) -> Opportunity {
    seed_opportunity_on(
        store,
        capacity_needed,
        capacity_filled,
        now_ms() + Duration::days(7),
    )
    .await
}

pub async fn seed_opportunity_on(
    store: &dyn DocumentStore,
    capacity_needed: u32,
    capacity_filled: u32,
    service_date: DateTime<Utc>,
) -> Opportunity {
    let opportunity = Opportunity {
        id: OpportunityId::new(),
        org_id: OrgId::new(),
        org_name: "Harvest Food Shelf".to_string(),
        title: "Weekend packing shift".to_string(),
        description: "Pack weekend food boxes for delivery".to_string(),
        requirements: None,
        contact_number: None,
        capacity_needed,
        capacity_filled,
        status: if capacity_filled >= capacity_needed {
            OpportunityStatus::Closed
        } else {
            OpportunityStatus::Active
        },
        service_date: align(service_date),
        created_at: now_ms(),
    };
    opportunity.insert(store).await.unwrap();
    opportunity
}

/// Seed a pending application from a fresh applicant.
pub async fn seed_pending_application(
    store: &dyn DocumentStore,
    opportunity: &Opportunity,
) -> Application {
    seed_application_for(
        store,
        opportunity,
        ApplicantId::new(),
        ApplicationStatus::Pending,
        now_ms(),
    )
    .await
}

pub async fn seed_application_for(
    store: &dyn DocumentStore,
    opportunity: &Opportunity,
    applicant_id: ApplicantId,
    status: ApplicationStatus,
    applied_at: DateTime<Utc>,
) -> Application {
    let application = Application {
        id: ApplicationId::new(),
        opportunity_id: opportunity.id,
        applicant_id,
        org_id: opportunity.org_id,
        org_name: opportunity.org_name.clone(),
        opportunity_title: opportunity.title.clone(),
        service_date: opportunity.service_date,
        status,
        applied_at: align(applied_at),
    };
    application.insert(store).await.unwrap();
    application
}

/// Fetch an opportunity that is expected to exist.
pub async fn fetch_opportunity(store: &dyn DocumentStore, id: OpportunityId) -> Opportunity {
    Opportunity::fetch(store, id).await.unwrap().unwrap()
}

/// Fetch an application that is expected to exist.
pub async fn fetch_application(store: &dyn DocumentStore, id: ApplicationId) -> Application {
    Application::fetch(store, id).await.unwrap().unwrap()
}
