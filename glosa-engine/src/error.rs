use crate::classifier::GlosaStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlosaError {
    #[error("Malformed return document: {0}")]
    Structure(String),

    #[error("Return document is missing {0}")]
    MissingField(&'static str),

    #[error("Invalid monetary value in {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid glosa table: {0}")]
    Table(#[from] serde_json::Error),

    #[error("Status cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: GlosaStatus, to: GlosaStatus },
}

pub type GlosaResult<T> = Result<T, GlosaError>;
