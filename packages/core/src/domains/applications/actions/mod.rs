//! Application actions - the decision engines and applicant-side
//! operations.

pub mod accept_eligible;
pub mod apply;
pub mod decide;
pub mod remove;

pub use accept_eligible::{accept_eligible, BulkAcceptError, BulkOutcome};
pub use apply::{submit_application, ApplyError};
pub use decide::{decide_application, Decision, DecisionError};
pub use remove::{remove_orphaned_application, withdraw_application, WithdrawError};
