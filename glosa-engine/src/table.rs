//! Rejection code table
//!
//! Maps payer glosa codes to a category, a suggested action and whether the fix can be applied
//! mechanically. The built-in table covers the principal codes only; payers publish their own
//! additions, which can be loaded with [`GlosaTable::from_json`] or added with
//! [`GlosaTable::insert`].

use crate::error::GlosaResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Rejection category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlosaCategory {
    Administrative,
    Technical,
    Authorization,
    Coverage,
    Duplicate,
    Value,
    Deadline,
    Documentation,
    Other,
}

impl GlosaCategory {
    pub const ALL: [GlosaCategory; 9] = [
        GlosaCategory::Administrative,
        GlosaCategory::Technical,
        GlosaCategory::Authorization,
        GlosaCategory::Coverage,
        GlosaCategory::Duplicate,
        GlosaCategory::Value,
        GlosaCategory::Deadline,
        GlosaCategory::Documentation,
        GlosaCategory::Other,
    ];

    /// Category implied by the first digit of a code
    pub fn from_code_prefix(code: &str) -> Self {
        match code.trim().chars().next() {
            Some('1') => GlosaCategory::Administrative,
            Some('2') => GlosaCategory::Technical,
            Some('3') => GlosaCategory::Authorization,
            Some('4') => GlosaCategory::Coverage,
            Some('5') => GlosaCategory::Duplicate,
            Some('6') => GlosaCategory::Value,
            Some('7') => GlosaCategory::Deadline,
            Some('8') => GlosaCategory::Documentation,
            _ => GlosaCategory::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GlosaCategory::Administrative => "administrative",
            GlosaCategory::Technical => "technical",
            GlosaCategory::Authorization => "authorization",
            GlosaCategory::Coverage => "coverage",
            GlosaCategory::Duplicate => "duplicate",
            GlosaCategory::Value => "value",
            GlosaCategory::Deadline => "deadline",
            GlosaCategory::Documentation => "documentation",
            GlosaCategory::Other => "other",
        }
    }
}

impl fmt::Display for GlosaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Remediation suggested for a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    Resubmit,
    FixRegistration,
    RequestAuthorization,
    AttachDocumentation,
    CorrectValues,
    Appeal,
    CancelDuplicate,
    ContactPayer,
}

impl SuggestedAction {
    /// Work order rank, 1 handled first
    pub fn priority(&self) -> u8 {
        match self {
            SuggestedAction::Resubmit => 1,
            SuggestedAction::FixRegistration => 2,
            SuggestedAction::RequestAuthorization => 3,
            SuggestedAction::AttachDocumentation => 4,
            SuggestedAction::CorrectValues => 5,
            SuggestedAction::Appeal => 6,
            SuggestedAction::CancelDuplicate => 7,
            SuggestedAction::ContactPayer => 8,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SuggestedAction::Resubmit => "resubmit",
            SuggestedAction::FixRegistration => "fix_registration",
            SuggestedAction::RequestAuthorization => "request_authorization",
            SuggestedAction::AttachDocumentation => "attach_documentation",
            SuggestedAction::CorrectValues => "correct_values",
            SuggestedAction::Appeal => "appeal",
            SuggestedAction::CancelDuplicate => "cancel_duplicate",
            SuggestedAction::ContactPayer => "contact_payer",
        }
    }

    /// Operator instruction for a group of records sharing this action
    pub fn instruction(&self) -> &'static str {
        match self {
            SuggestedAction::Resubmit => "Correct the flagged fields and resubmit the guides in a new lot",
            SuggestedAction::FixRegistration => "Update beneficiary or provider registration data, then resubmit",
            SuggestedAction::RequestAuthorization => "Obtain the missing prior authorization and resubmit with its number",
            SuggestedAction::AttachDocumentation => "Attach the requested clinical or billing documents to an appeal",
            SuggestedAction::CorrectValues => "Recalculate billed values against the contracted price table",
            SuggestedAction::Appeal => "File a glosa appeal with clinical justification",
            SuggestedAction::CancelDuplicate => "Confirm the duplicate and withdraw the repeated charge",
            SuggestedAction::ContactPayer => "Contact the payer's provider relations team for clarification",
        }
    }
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Table entry for one rejection code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlosaRule {
    pub category: GlosaCategory,
    pub action: SuggestedAction,
    #[serde(default)]
    pub automatable: bool,
    #[serde(default)]
    pub guidance: String,
}

impl GlosaRule {
    pub fn new(
        category: GlosaCategory,
        action: SuggestedAction,
        automatable: bool,
        guidance: impl Into<String>,
    ) -> Self {
        Self {
            category,
            action,
            automatable,
            guidance: guidance.into(),
        }
    }
}

use GlosaCategory as C;
use SuggestedAction as A;

const PRINCIPAL_CODES: &[(&str, GlosaCategory, SuggestedAction, bool, &str)] = &[
    ("1001", C::Administrative, A::FixRegistration, true, "Beneficiary card number is invalid"),
    ("1002", C::Administrative, A::FixRegistration, true, "National health card number is invalid"),
    ("1006", C::Administrative, A::ContactPayer, false, "Service after the beneficiary left the plan"),
    ("1017", C::Administrative, A::FixRegistration, false, "Beneficiary card has expired"),
    ("1203", C::Administrative, A::FixRegistration, true, "Provider code at the payer is invalid"),
    ("1307", C::Administrative, A::Resubmit, true, "Guide number is invalid"),
    ("2001", C::Technical, A::Resubmit, true, "Procedure not found in the reference table"),
    ("2005", C::Technical, A::Appeal, false, "Procedure incompatible with the beneficiary's sex"),
    ("2008", C::Technical, A::Resubmit, true, "Procedure quantity must be greater than zero"),
    ("2010", C::Technical, A::Resubmit, true, "Procedure or table code is invalid"),
    ("2013", C::Technical, A::Appeal, false, "Diagnosis incompatible with the procedure"),
    ("3001", C::Authorization, A::RequestAuthorization, false, "Procedure requires prior authorization"),
    ("3002", C::Authorization, A::RequestAuthorization, false, "Authorization has expired"),
    ("3005", C::Authorization, A::Resubmit, true, "Authorization number is invalid"),
    ("4001", C::Coverage, A::Appeal, false, "Procedure not covered by the beneficiary's plan"),
    ("4002", C::Coverage, A::ContactPayer, false, "Beneficiary still in the waiting period"),
    ("5001", C::Duplicate, A::CancelDuplicate, true, "Guide already presented"),
    ("5002", C::Duplicate, A::CancelDuplicate, true, "Procedure billed twice"),
    ("6001", C::Value, A::CorrectValues, true, "Billed value above the contracted value"),
    ("6002", C::Value, A::CorrectValues, true, "Billed value below the contracted value"),
    ("6005", C::Value, A::Appeal, false, "Package value not agreed with the payer"),
    ("7001", C::Deadline, A::Appeal, false, "Guide presented after the submission deadline"),
    ("7002", C::Deadline, A::ContactPayer, false, "Appeal filed after the deadline"),
    ("8001", C::Documentation, A::AttachDocumentation, false, "Medical report missing"),
    ("8002", C::Documentation, A::AttachDocumentation, false, "Beneficiary signature missing"),
    ("8005", C::Documentation, A::AttachDocumentation, false, "Materials invoice missing"),
];

/// Rejection code lookup table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlosaTable {
    rules: HashMap<String, GlosaRule>,
}

impl Default for GlosaTable {
    /// Table with the principal codes
    fn default() -> Self {
        let rules = PRINCIPAL_CODES
            .iter()
            .map(|(code, category, action, automatable, guidance)| {
                (
                    (*code).to_string(),
                    GlosaRule::new(*category, *action, *automatable, *guidance),
                )
            })
            .collect();
        Self { rules }
    }
}

impl GlosaTable {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Table from a JSON object of `code -> rule`
    ///
    /// ```
    /// use glosa_engine::{GlosaCategory, GlosaTable};
    ///
    /// let table = GlosaTable::from_json(
    ///     r#"{"9901": {"category": "value", "action": "correct_values", "automatable": true}}"#,
    /// ).unwrap();
    /// assert_eq!(table.lookup("9901").map(|r| r.category), Some(GlosaCategory::Value));
    /// ```
    pub fn from_json(json: &str) -> GlosaResult<Self> {
        let rules: HashMap<String, GlosaRule> = serde_json::from_str(json)?;
        Ok(Self { rules })
    }

    /// Add JSON rules on top of this table, replacing codes already present
    pub fn extend_from_json(&mut self, json: &str) -> GlosaResult<()> {
        let rules: HashMap<String, GlosaRule> = serde_json::from_str(json)?;
        self.rules.extend(rules);
        Ok(())
    }

    /// Add or replace one rule, returning the previous one
    pub fn insert(&mut self, code: impl Into<String>, rule: GlosaRule) -> Option<GlosaRule> {
        self.rules.insert(code.into(), rule)
    }

    pub fn lookup(&self, code: &str) -> Option<&GlosaRule> {
        self.rules.get(code.trim())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
