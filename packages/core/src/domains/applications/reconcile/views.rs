//! Steps B-C: timing views, orphan flags, and view ordering.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::common::OpportunityId;
use crate::domains::applications::models::application::{Application, ApplicationStatus};
use crate::domains::opportunities::models::opportunity::Opportunity;

/// Result of looking up an application's opportunity during one pass.
#[derive(Debug, Clone)]
pub enum OpportunityLookup {
    Found(Opportunity),
    /// The opportunity document no longer exists: the application is
    /// orphaned.
    Missing,
    /// The read failed this pass. Orphan status stays undetermined and
    /// the next notification retries the check.
    Unknown,
}

/// One row of an applicant's reconciled view.
#[derive(Debug, Clone)]
pub struct ReconciledApplication {
    pub application: Application,
    /// Live opportunity document, when it exists and was readable.
    pub opportunity: Option<Opportunity>,
    /// Set only when the opportunity is confirmed deleted - never on a
    /// failed read.
    pub orphaned: bool,
}

impl ReconciledApplication {
    /// Service date used for filtering and ordering: the live
    /// opportunity's when available (it tracks edits), otherwise the
    /// snapshot taken at apply time.
    fn service_date(&self) -> DateTime<Utc> {
        self.opportunity
            .as_ref()
            .map(|o| o.service_date)
            .unwrap_or(self.application.service_date)
    }
}

/// An applicant's reconciled application lists.
#[derive(Debug, Clone, Default)]
pub struct ApplicationViews {
    /// Upcoming engagements: service date not yet passed, soonest first.
    pub current: Vec<ReconciledApplication>,
    /// Completed engagements: accepted applications whose service date
    /// has passed, most recent first.
    pub history: Vec<ReconciledApplication>,
}

/// Build the current/history views from deduplicated applications and
/// this pass's opportunity lookups.
///
/// Applications whose service date has passed leave the current view;
/// only the accepted ones among them appear in history.
pub fn build_views(
    applications: Vec<Application>,
    lookups: &HashMap<OpportunityId, OpportunityLookup>,
    now: DateTime<Utc>,
) -> ApplicationViews {
    let mut current = Vec::new();
    let mut history = Vec::new();

    for application in applications {
        let (opportunity, orphaned) = match lookups.get(&application.opportunity_id) {
            Some(OpportunityLookup::Found(opportunity)) => (Some(opportunity.clone()), false),
            Some(OpportunityLookup::Missing) => (None, true),
            Some(OpportunityLookup::Unknown) | None => (None, false),
        };
        let row = ReconciledApplication {
            application,
            opportunity,
            orphaned,
        };

        if row.service_date() <= now {
            if row.application.status == ApplicationStatus::Accepted {
                history.push(row);
            }
            // Passed but not accepted: in neither view.
        } else {
            current.push(row);
        }
    }

    current.sort_by(|a, b| {
        a.service_date()
            .cmp(&b.service_date())
            .then_with(|| b.application.applied_at.cmp(&a.application.applied_at))
    });
    history.sort_by(|a, b| {
        b.service_date()
            .cmp(&a.service_date())
            .then_with(|| b.application.applied_at.cmp(&a.application.applied_at))
    });

    ApplicationViews { current, history }
}
