//! Reports Backend Module
//!
//! Read-only views over the history service: per-spin and per-session
//! listings, aggregates by game or country with the play-for-real split,
//! and the financial summary. Any report can be exported as CSV or XLSX
//! through a background job whose status is polled over HTTP or pushed
//! over a WebSocket.
//!
//! Clean Architecture structure:
//! - `domain/` - Report rows, filters, export files, repository traits
//! - `application/` - Report queries, export engine, rendering
//! - `infra/` - Key/value job store, PostgreSQL game directory
//! - `presentation/` - HTTP handlers, status WebSocket, routers

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

mod tests;

pub use application::{ExportConfig, ExportEngine, ReportService};
pub use error::{ReportError, ReportResult};
pub use infra::{KvFileStore, PgGameDirectory};
pub use presentation::{ReportAppState, public_reports_router, reports_router};
