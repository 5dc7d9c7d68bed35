//! Opportunity actions.

pub mod post;
pub mod remove;

pub use post::{post_opportunity, NewOpportunity, PostError};
pub use remove::remove_opportunity;
