//! Opportunity domain - capacity-limited volunteer opportunities posted
//! by provider organizations.

pub mod actions;
pub mod models;

// Re-export commonly used types
pub use models::opportunity::{Opportunity, OpportunityStatus};
