//! Domain Layer
//!
//! Report rows, filters, export files and repository traits.

pub mod file;
pub mod filter;
pub mod report;
pub mod repository;

pub use file::{CsvRows, ExportFile, FilePayload, FileStatus, FileSummary, FileType};
pub use filter::{ReportQuery, ReportScope};
pub use report::{
    AggregatedReport, Columns, FinancialReport, GamingSessionReport, Grouping, Prettify,
    ReportKind, SpinReport,
};
pub use repository::{FileRepository, GameDirectory};
