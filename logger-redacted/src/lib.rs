//! Tracing setup with automatic redaction for TISS payloads
//!
//! TISS envelopes carry beneficiary card numbers, names, provider tax ids and, when the payer
//! requires it, a login/password header. Anything that logs a wire document passes it through
//! a [`PiiRedactor`] first.
//!
//! # Detected Data Types
//!
//! - **CNPJ**: `12.345.678/0001-90` or 14 bare digits
//! - **CPF**: `123.456.789-09` or 11 bare digits
//! - **CNS**: 15-digit national health card numbers
//! - **Wire fields**: `numeroCarteira`, beneficiary names, `loginPrestador`, `senhaPrestador`
//! - **Custom Patterns**: caller supplied regex/replacement pairs
//!
//! Redacted values are replaced by a short SHA-256 prefix so two log lines about the same
//! beneficiary can still be correlated.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::PiiRedactor;
//!
//! let redactor = PiiRedactor::default();
//! let line = redactor.redact("<ans:senhaPrestador>s3cr3t</ans:senhaPrestador>");
//! assert!(!line.contains("s3cr3t"));
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Invalid redacted field name '{0}'")]
    InvalidField(String),

    #[error("Subscriber initialization failed: {0}")]
    Init(String),
}

/// Install the global `tracing` subscriber, writing to stderr so command output on stdout
/// stays parseable.
///
/// `RUST_LOG` wins over `config.log_level` when set. Returns the redactor callers should use for
/// payload logging, built from the same configuration.
pub fn init(config: &LoggerConfig) -> Result<PiiRedactor, LoggerError> {
    let redactor = config.redactor()?;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|_| LoggerError::InvalidFilter(config.log_level.clone()))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.show_targets)
        .with_writer(std::io::stderr);
    match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| LoggerError::Init(e.to_string()))?;

    tracing::debug!(
        format = ?config.format,
        redaction = config.redaction_enabled,
        extra_fields = config.extra_wire_fields.len(),
        "logging initialized"
    );

    Ok(redactor)
}
