//! Catalog Error Types

use axum::response::{IntoResponse, Response};
use kernel::error::app_error::{AppError, FieldError};
use kernel::error::kind::ErrorKind;
use kernel::organization::OrganizationType;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Organization pair not found")]
    PairNotFound,

    #[error("Game not found")]
    GameNotFound,

    #[error("Wager set not found")]
    WagerSetNotFound,

    #[error("Currency not found")]
    CurrencyNotFound,

    #[error("Currency multiplier not found")]
    MultiplierNotFound,

    #[error("Currency set not found")]
    CurrencySetNotFound,

    #[error("Dictionary not found: {0}")]
    DictionaryNotFound(String),

    #[error("Exchange rate not found")]
    RateNotFound,

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// Pair rows are reported as a conflict
    #[error("Organizations are already paired")]
    PairExists,

    #[error("Organization is in use: {0}")]
    OrganizationInUse(String),

    #[error("Currency is referenced by a multiplier")]
    CurrencyInUse,

    #[error("Currency is the base of a fake currency")]
    CurrencyIsBase,

    #[error("Organization must be of type {0}")]
    WrongOrganizationType(OrganizationType),

    #[error("Default wager is not in the wager levels")]
    DefaultWagerOutOfList,

    #[error("Wager levels must be positive")]
    NegativeWager,

    #[error("Fake currency needs an existing real base currency")]
    InvalidBaseCurrency,

    #[error("Game is not assigned to the integrator")]
    GameNotAssigned,

    #[error("Dictionary {0} is read-only")]
    DictionaryReadOnly(String),

    /// Refuse to publish a configuration with no entries
    #[error("Configuration snapshot is empty")]
    EmptyConfig,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Gateway(#[from] gateway::GatewayError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CatalogError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CatalogError::Validation(vec![FieldError::new(field, message)])
    }

    /// Validation error from accumulated fields, `Ok` when there are none
    pub fn check(fields: Vec<FieldError>) -> CatalogResult<()> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(fields))
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::OrganizationNotFound
            | CatalogError::PairNotFound
            | CatalogError::GameNotFound
            | CatalogError::WagerSetNotFound
            | CatalogError::CurrencyNotFound
            | CatalogError::MultiplierNotFound
            | CatalogError::CurrencySetNotFound
            | CatalogError::DictionaryNotFound(_)
            | CatalogError::RateNotFound => ErrorKind::NotFound,
            CatalogError::PairExists => ErrorKind::Conflict,
            CatalogError::AlreadyExists(_)
            | CatalogError::OrganizationInUse(_)
            | CatalogError::CurrencyInUse
            | CatalogError::CurrencyIsBase
            | CatalogError::WrongOrganizationType(_)
            | CatalogError::DefaultWagerOutOfList
            | CatalogError::NegativeWager
            | CatalogError::InvalidBaseCurrency
            | CatalogError::GameNotAssigned
            | CatalogError::DictionaryReadOnly(_)
            | CatalogError::EmptyConfig
            | CatalogError::Csv(_) => ErrorKind::BadRequest,
            CatalogError::Validation(_) => ErrorKind::UnprocessableEntity,
            CatalogError::App(e) => e.kind(),
            CatalogError::Database(e) => database_error_kind(e),
            CatalogError::Gateway(e) => gateway_error_kind(e),
        }
    }

    fn log(&self) {
        match self {
            CatalogError::Database(e) => tracing::error!(error = %e, "Catalog database error"),
            CatalogError::Gateway(e) => tracing::error!(error = %e, "Catalog gateway error"),
            CatalogError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Catalog internal error")
            }
            _ => tracing::debug!(error = %self, "Catalog error"),
        }
    }
}

fn database_error_kind(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::Database(db) if db.code().is_some_and(|c| c.starts_with("23")) => {
            ErrorKind::BadRequest
        }
        _ => ErrorKind::InternalServerError,
    }
}

fn gateway_error_kind(err: &gateway::GatewayError) -> ErrorKind {
    if err.is_not_found() {
        ErrorKind::NotFound
    } else {
        ErrorKind::InternalServerError
    }
}

/// Map a unique violation to `AlreadyExists(what)`, everything else through
pub(crate) fn unique_violation(err: sqlx::Error, what: &'static str) -> CatalogError {
    let is_unique = matches!(
        &err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    );
    if is_unique {
        CatalogError::AlreadyExists(what)
    } else {
        CatalogError::Database(err)
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::App(e) => e,
            CatalogError::Database(e) => AppError::from(e),
            CatalogError::Gateway(e) => AppError::from(e),
            CatalogError::Validation(fields) => AppError::validation(fields),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
