//! Logging settings as they appear in the `logging` section of the operator configuration.

use crate::redactor::{PiiRedactor, RedactionConfig};
use crate::LoggerError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Layout of events on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per event, for log shippers
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub log_level: String,
    pub format: LogFormat,
    /// Emit module targets alongside each event
    pub show_targets: bool,
    /// Mask tax ids, card numbers and credentials in logged payloads
    pub redaction_enabled: bool,
    /// Replace masked values with a short digest so lines about one beneficiary correlate
    pub hash_for_correlation: bool,
    /// Payer-specific element names whose bodies are masked on top of the built-in ones
    pub extra_wire_fields: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::default(),
            show_targets: false,
            redaction_enabled: true,
            hash_for_correlation: true,
            extra_wire_fields: Vec::new(),
        }
    }
}

impl LoggerConfig {
    /// Redaction rules for these settings; element names must be plain XML names
    pub fn redaction_config(&self) -> Result<RedactionConfig, LoggerError> {
        if !self.redaction_enabled {
            return Ok(RedactionConfig::none());
        }

        let mut custom_patterns = Vec::with_capacity(self.extra_wire_fields.len());
        for field in &self.extra_wire_fields {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(LoggerError::InvalidField(field.clone()));
            }
            let pattern = Regex::new(&format!(
                r"(<(?:[A-Za-z_][\w.-]*:)?{0}>)[^<]+(</(?:[A-Za-z_][\w.-]*:)?{0}>)",
                field
            ))
            .map_err(|_| LoggerError::InvalidField(field.clone()))?;
            custom_patterns.push((pattern, "${1}[REDACTED]${2}".to_string()));
        }

        Ok(RedactionConfig {
            hash_for_correlation: self.hash_for_correlation,
            custom_patterns,
            ..RedactionConfig::default()
        })
    }

    pub fn redactor(&self) -> Result<PiiRedactor, LoggerError> {
        Ok(PiiRedactor::new(self.redaction_config()?))
    }
}
