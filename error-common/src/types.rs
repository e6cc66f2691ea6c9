use serde::{Deserialize, Serialize};
use std::fmt;

/// How a validation finding affects the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document must not be transmitted
    Error,
    /// The document is acceptable but something looks off
    Warning,
}

/// One field-level finding with a stable code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub field: Option<String>,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            field: None,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            field: None,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {}: {}", self.code, field, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn test_display_includes_code_and_field() {
        let issue = ValidationIssue::error(codes::rules::INVALID_STATE, "unknown state 'XX'")
            .with_field("UF");
        assert_eq!(issue.to_string(), "[TISS_R015] UF: unknown state 'XX'");
        assert!(issue.is_error());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let issue = ValidationIssue::warning(codes::warnings::FUTURE_DATE, "date in the future");
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
    }
}
