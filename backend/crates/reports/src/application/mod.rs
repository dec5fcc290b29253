//! Application Layer
//!
//! Report queries, export jobs and their rendering.

pub mod config;
pub mod export;
pub mod render;
pub mod report_service;
pub mod scope;

// Re-exports
pub use config::ExportConfig;
pub use export::{ExportEngine, ExportJob, StatusFrame};
pub use render::{render_csv, render_financial_workbook, render_workbook};
pub use report_service::ReportService;
pub use scope::resolve_scope;
