//! Message Validator
//!
//! Two phases over a wire document:
//!
//! - **structural**: declaration, encoding, namespace, root, version tag, header sections,
//!   epilogue and the guide cap
//! - **business rules**: digest re-verification, fixed-format fields, declared lengths,
//!   monetary values, plus warnings for future dates and loosely matching diagnosis codes
//!
//! Findings are returned as [`ValidationIssue`]s. Only a document that cannot be parsed at all
//! is a hard failure.

mod rules;
mod structural;

use crate::error::{BillingError, BillingResult};
use crate::version::ProtocolVersion;
use chrono::{Local, NaiveDate};
use error_common::ValidationIssue;
use integrity_engine::tree::{self, Document};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of both validation phases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(issues: impl IntoIterator<Item = ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues.into_iter().partition(|i| i.is_error());
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Turn a failed report into [`BillingError::Validation`]
    pub fn into_result(self) -> BillingResult<Self> {
        if self.valid {
            Ok(self)
        } else {
            Err(BillingError::Validation(self.errors))
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|i| i.code == code)
    }
}

/// Version-specific document validator
pub trait MessageValidator: Send + Sync {
    fn version(&self) -> ProtocolVersion;

    fn structural(&self, doc: &str) -> BillingResult<Vec<ValidationIssue>>;

    fn business_rules(&self, doc: &str) -> BillingResult<Vec<ValidationIssue>>;

    /// Both phases combined
    fn validate(&self, doc: &str) -> BillingResult<ValidationReport> {
        let mut issues = self.structural(doc)?;
        issues.extend(self.business_rules(doc)?);
        let report = ValidationReport::from_issues(issues);
        debug!(
            version = %self.version(),
            valid = report.valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "document validated"
        );
        Ok(report)
    }
}

#[derive(Debug, Clone)]
pub struct TissValidator {
    version: ProtocolVersion,
    reference_date: Option<NaiveDate>,
}

impl TissValidator {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            reference_date: None,
        }
    }

    /// Judge "future" dates against a fixed day instead of the local clock
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

fn parse(doc: &str) -> BillingResult<Document> {
    tree::parse(doc).map_err(|e| BillingError::Structure(e.to_string()))
}

impl MessageValidator for TissValidator {
    fn version(&self) -> ProtocolVersion {
        self.version
    }

    fn structural(&self, doc: &str) -> BillingResult<Vec<ValidationIssue>> {
        let parsed = parse(doc)?;
        Ok(structural::check(&parsed))
    }

    fn business_rules(&self, doc: &str) -> BillingResult<Vec<ValidationIssue>> {
        let parsed = parse(doc)?;
        Ok(rules::check(doc, &parsed.root, self.today()))
    }
}
