//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of the back-office vocabulary:
//! - Common error types, the response envelope and result aliases
//! - Typed identifiers shared by every bounded context
//! - Pagination requests / pages shared by every list endpoint
//! - Organization types (integrator / provider / operator)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod organization;
pub mod pagination;
#[cfg(feature = "axum")]
pub mod response;
