//! Export Files
//!
//! An export job and its artifact share one record. CSV artifacts keep the
//! typed rows and are rendered at download; XLSX artifacts keep the
//! workbook bytes.

use std::fmt;

use chrono::{DateTime, Utc};
use kernel::id::FileId;
use serde::{Deserialize, Serialize};

use crate::domain::report::{
    AggregatedReport, FinancialReport, GamingSessionReport, ReportKind, SpinReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    InProgress,
    Ready,
    Error,
}

impl FileStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FileStatus::InProgress => "in_progress",
            FileStatus::Ready => "ready",
            FileStatus::Error => "error",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, FileStatus::InProgress)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Xlsx,
}

impl FileType {
    pub const fn extension(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
        }
    }

    pub const fn content_type(&self) -> &'static str {
        match self {
            FileType::Csv => "text/csv; charset=utf-8",
            FileType::Xlsx => "application/octet-stream",
        }
    }
}

/// Typed CSV rows, tagged with the row kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum CsvRows {
    Financial(Vec<FinancialReport>),
    Spin(Vec<SpinReport>),
    GamingSession(Vec<GamingSessionReport>),
    AggregatedByGame(Vec<AggregatedReport>),
    AggregatedByCountry(Vec<AggregatedReport>),
}

impl CsvRows {
    pub fn len(&self) -> usize {
        match self {
            CsvRows::Financial(rows) => rows.len(),
            CsvRows::Spin(rows) => rows.len(),
            CsvRows::GamingSession(rows) => rows.len(),
            CsvRows::AggregatedByGame(rows) | CsvRows::AggregatedByCountry(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum FilePayload {
    Csv {
        rows: CsvRows,
    },
    Xlsx {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    /// Worker error text, verbatim
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFile {
    pub id: FileId,
    pub status: FileStatus,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub report: ReportKind,
    /// Download name, `{report}-YYYYMMDDhhmmss.{ext}`
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub payload: Option<FilePayload>,
}

impl ExportFile {
    pub fn pending(report: ReportKind, file_type: FileType) -> Self {
        let created_at = Utc::now();
        Self {
            id: FileId::new(),
            status: FileStatus::InProgress,
            file_type,
            report,
            name: format!(
                "{}-{}.{}",
                report.file_prefix(),
                created_at.format("%Y%m%d%H%M%S"),
                file_type.extension()
            ),
            created_at,
            payload: None,
        }
    }

    pub fn ready(mut self, payload: FilePayload) -> Self {
        self.status = FileStatus::Ready;
        self.payload = Some(payload);
        self
    }

    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = FileStatus::Error;
        self.payload = Some(FilePayload::Error {
            message: message.into(),
        });
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.payload {
            Some(FilePayload::Error { message }) => Some(message),
            _ => None,
        }
    }
}

/// Listing/status view without the artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub id: FileId,
    pub status: FileStatus,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub report: ReportKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl From<&ExportFile> for FileSummary {
    fn from(file: &ExportFile) -> Self {
        Self {
            id: file.id,
            status: file.status,
            file_type: file.file_type,
            report: file.report,
            name: file.name.clone(),
            created_at: file.created_at,
            error: file.error_message().map(str::to_string),
        }
    }
}

mod base64_bytes {
    use platform::crypto::{from_base64, to_base64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_base64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}
