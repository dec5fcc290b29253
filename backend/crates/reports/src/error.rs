//! Report Error Types

use axum::response::{IntoResponse, Response};
use kernel::error::app_error::{AppError, FieldError};
use kernel::error::kind::ErrorKind;
use platform::kv::KvError;
use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("File not found")]
    FileNotFound,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Gateway(#[from] gateway::GatewayError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("File store error: {0}")]
    Store(#[from] KvError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ReportError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::NotFound(_) | ReportError::FileNotFound => ErrorKind::NotFound,
            ReportError::Validation(_) => ErrorKind::UnprocessableEntity,
            ReportError::App(e) => e.kind(),
            ReportError::Gateway(e) if e.is_not_found() => ErrorKind::NotFound,
            ReportError::Gateway(_)
            | ReportError::Database(_)
            | ReportError::Store(_)
            | ReportError::Csv(_)
            | ReportError::Xlsx(_)
            | ReportError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    fn log(&self) {
        match self {
            ReportError::Gateway(e) => tracing::error!(error = %e, "History service error"),
            ReportError::Database(e) => tracing::error!(error = %e, "Report database error"),
            ReportError::Store(e) => tracing::error!(error = %e, "File store error"),
            ReportError::Csv(_) | ReportError::Xlsx(_) | ReportError::Internal(_) => {
                tracing::error!(error = %self, "Report rendering error")
            }
            ReportError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Report internal error")
            }
            _ => tracing::debug!(error = %self, "Report error"),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::App(e) => e,
            ReportError::Gateway(e) => AppError::from(e),
            ReportError::Database(e) => AppError::from(e),
            ReportError::Validation(fields) => AppError::validation(fields),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_currency_is_422() {
        let app = AppError::from(ReportError::validation("currency", "required"));
        assert_eq!(app.status_code(), 422);
        assert_eq!(app.fields()[0].field, "currency");
    }

    #[test]
    fn test_error_kinds() {
        let err = ReportError::Internal("worker panicked".into());
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
        assert_eq!(ReportError::FileNotFound.kind(), ErrorKind::NotFound);
    }
}
