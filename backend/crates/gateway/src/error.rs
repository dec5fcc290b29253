//! Gateway Error Types

use kernel::error::app_error::AppError;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while talking to downstream services
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Endpoint URL could not be parsed
    #[error("Invalid endpoint {0}")]
    InvalidEndpoint(String),

    /// Channel could not be established or broke
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Remote returned a non-OK gRPC status
    #[error("{service} call failed: {status}")]
    Status {
        service: &'static str,
        status: tonic::Status,
    },

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote answered with a payload we cannot interpret
    #[error("Malformed response from {service}: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },
}

impl GatewayError {
    pub fn status(service: &'static str, status: tonic::Status) -> Self {
        GatewayError::Status { service, status }
    }

    pub fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        GatewayError::Malformed {
            service,
            detail: detail.into(),
        }
    }

    /// Whether the remote said the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Status { status, .. } if status.code() == tonic::Code::NotFound)
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        if err.is_not_found() {
            return AppError::not_found(err.to_string()).with_source(err);
        }
        match &err {
            GatewayError::Status { status, .. }
                if status.code() == tonic::Code::Unavailable =>
            {
                AppError::service_unavailable(err.to_string()).with_source(err)
            }
            GatewayError::Status { status, .. }
                if status.code() == tonic::Code::InvalidArgument =>
            {
                AppError::bad_request(status.message().to_string()).with_source(err)
            }
            _ => AppError::internal(err.to_string()).with_source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status_maps_to_404() {
        let err = GatewayError::status("history", tonic::Status::not_found("no spin"));
        assert!(err.is_not_found());
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 404);
    }

    #[test]
    fn test_invalid_argument_maps_to_400() {
        let err = GatewayError::status("exchange", tonic::Status::invalid_argument("bad rate"));
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.message(), "bad rate");
    }

    #[test]
    fn test_other_errors_are_internal() {
        let app: AppError = GatewayError::Mail("rejected".into()).into();
        assert_eq!(app.status_code(), 500);
    }
}
