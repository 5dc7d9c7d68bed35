//! Typed ID definitions for all domain entities.
//!
//! Each domain entity gets its own incompatible ID type, so the compiler
//! catches an `ApplicationId` handed to an opportunity lookup.

// Re-export the core Id type
pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Opportunity entities (capacity-limited activities).
pub struct Opportunity;

/// Marker type for Application entities (one applicant's request to join
/// one opportunity).
pub struct Application;

/// Marker type for applicant accounts.
pub struct Applicant;

/// Marker type for opportunity-provider organizations.
pub struct Organization;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Opportunity entities.
pub type OpportunityId = Id<Opportunity>;

/// Typed ID for Application entities.
pub type ApplicationId = Id<Application>;

/// Typed ID for applicant accounts.
pub type ApplicantId = Id<Applicant>;

/// Typed ID for provider organizations.
pub type OrgId = Id<Organization>;
