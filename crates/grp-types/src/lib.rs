//! Core types and traits for the group membership propagation filter.
//!
//! Audit-log and Cloud Identity DTOs keep the upstream JSON field names via serde renames.

mod dto;
mod traits;

pub use dto::*;
pub use traits::*;
