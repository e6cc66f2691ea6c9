use error_common::ValidationIssue;
use integrity_engine::IntegrityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Malformed document: {0}")]
    Structure(String),

    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("No implementation registered for protocol version {0}")]
    UnsupportedVersion(String),

    #[error("Protocol version {version} has a {present} but no {missing} registered")]
    IncompleteRegistration {
        version: String,
        present: &'static str,
        missing: &'static str,
    },

    #[error("Lot holds {count} guides, the limit is {max}")]
    LotSizeExceeded { count: usize, max: usize },

    #[error("Validation failed with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("Invalid monetary value '{0}'")]
    InvalidMoney(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type BillingResult<T> = Result<T, BillingError>;
