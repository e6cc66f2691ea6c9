use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsuranceError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure, timeout or 5xx answer; retried within the budget
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Payer answered HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Gave up after {attempts} attempt(s): {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Remote fault {code}: {message}")]
    RemoteFault { code: String, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Payload cannot be encoded: {0}")]
    Encoding(#[from] integrity_engine::IntegrityError),
}

impl InsuranceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, InsuranceError::Transport(_))
    }
}

impl From<reqwest::Error> for InsuranceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            InsuranceError::Config(err.to_string())
        } else {
            InsuranceError::Transport(err.to_string())
        }
    }
}

pub type InsuranceResult<T> = Result<T, InsuranceError>;
