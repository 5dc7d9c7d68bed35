//! Applicant-side reconciliation.
//!
//! Keeps one applicant's view of their own applications internally
//! consistent: duplicate records for the same opportunity collapse to
//! one, past-dated opportunities move out of the current list, and
//! references to deleted opportunities are flagged as orphaned.
//!
//! The steps are pure functions over already-fetched data so they can be
//! tested against static snapshots; only the orphan-check lookups in
//! [`engine`] touch the store.

pub mod dedupe;
pub mod engine;
pub mod views;

pub use dedupe::dedupe_applications;
pub use engine::{reconcile_applications, reconcile_snapshot};
pub use views::{build_views, ApplicationViews, OpportunityLookup, ReconciledApplication};
