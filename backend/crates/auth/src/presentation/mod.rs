//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use extract::{AccessToken, CurrentSession};
pub use handlers::AuthAppState;
pub use middleware::{AuthGuard, authenticated, protected};
pub use router::auth_router;
