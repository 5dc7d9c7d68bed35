//! Step A: collapse duplicate application records per opportunity.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::common::OpportunityId;
use crate::domains::applications::models::application::Application;

/// Collapse duplicates so at most one application per opportunity
/// remains in the view.
///
/// A decided record beats a pending one - a decision, once made, is more
/// authoritative than a pending duplicate. Among records of equal
/// standing the latest `applied_at` wins; an exact tie keeps the earlier
/// record in input order, which makes the merge deterministic and
/// idempotent. Losers disappear from the view only; their store
/// documents are untouched.
pub fn dedupe_applications(applications: Vec<Application>) -> Vec<Application> {
    let mut kept: HashMap<OpportunityId, Application> = HashMap::new();
    let mut order: Vec<OpportunityId> = Vec::new();

    for application in applications {
        match kept.entry(application.opportunity_id) {
            Entry::Vacant(slot) => {
                order.push(application.opportunity_id);
                slot.insert(application);
            }
            Entry::Occupied(mut slot) => {
                if supersedes(&application, slot.get()) {
                    slot.insert(application);
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|opportunity_id| kept.remove(&opportunity_id))
        .collect()
}

/// Whether `challenger` replaces `incumbent` in the merged view.
fn supersedes(challenger: &Application, incumbent: &Application) -> bool {
    let challenger_decided = challenger.status.is_terminal();
    let incumbent_decided = incumbent.status.is_terminal();
    if challenger_decided != incumbent_decided {
        return challenger_decided;
    }
    challenger.applied_at > incumbent.applied_at
}
