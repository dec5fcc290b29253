//! Presentation Layer
//!
//! HTTP handlers, the status WebSocket, DTOs and routers.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::ReportAppState;
pub use router::{public_reports_router, reports_router};
