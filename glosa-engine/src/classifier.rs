use crate::error::{GlosaError, GlosaResult};
use crate::table::{GlosaCategory, GlosaTable, SuggestedAction};
use billing_service::Glosa;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Guidance for codes missing from the table
const FALLBACK_GUIDANCE: &str = "Code not in the rejection table; classified by its first digit";

/// Where a classification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Table,
    /// Code absent from the table, category derived from its first digit
    Fallback,
}

/// Lifecycle of a rejection on the provider side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlosaStatus {
    Pending,
    AppealSent,
    /// Loss acknowledged, no further action
    Accepted,
    /// Appeal granted by the payer
    Resolved,
}

impl GlosaStatus {
    pub fn can_move_to(&self, next: GlosaStatus) -> bool {
        use GlosaStatus::*;
        matches!(
            (self, next),
            (Pending, AppealSent) | (Pending, Accepted) | (AppealSent, Resolved) | (AppealSent, Accepted)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GlosaStatus::Accepted | GlosaStatus::Resolved)
    }
}

/// Table verdict for one code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: GlosaCategory,
    pub action: SuggestedAction,
    pub automatable: bool,
    pub guidance: String,
    pub source: ClassificationSource,
}

impl GlosaTable {
    /// Classify a code, falling back to its first digit when the table has no entry
    pub fn classify(&self, code: &str) -> Classification {
        match self.lookup(code) {
            Some(rule) => Classification {
                category: rule.category,
                action: rule.action,
                automatable: rule.automatable,
                guidance: rule.guidance.clone(),
                source: ClassificationSource::Table,
            },
            None => {
                let category = GlosaCategory::from_code_prefix(code);
                debug!(code, category = %category, "glosa code not in table, using fallback");
                Classification {
                    category,
                    action: SuggestedAction::ContactPayer,
                    automatable: false,
                    guidance: FALLBACK_GUIDANCE.to_string(),
                    source: ClassificationSource::Fallback,
                }
            }
        }
    }

    pub fn classify_glosa(&self, glosa: Glosa) -> ClassifiedGlosa {
        let classification = self.classify(&glosa.code);
        ClassifiedGlosa {
            glosa,
            classification,
            status: GlosaStatus::Pending,
            appealed: false,
        }
    }

    pub fn classify_all(&self, glosas: impl IntoIterator<Item = Glosa>) -> Vec<ClassifiedGlosa> {
        glosas.into_iter().map(|g| self.classify_glosa(g)).collect()
    }
}

/// Rejection record enriched with its classification and lifecycle status.
///
/// The underlying rejection is read-only once classified; only the status moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedGlosa {
    glosa: Glosa,
    classification: Classification,
    status: GlosaStatus,
    /// Set once the record has been through `AppealSent`, whatever the appeal's result
    #[serde(default)]
    appealed: bool,
}

impl ClassifiedGlosa {
    pub fn glosa(&self) -> &Glosa {
        &self.glosa
    }

    pub fn code(&self) -> &str {
        &self.glosa.code
    }

    pub fn rejected_value(&self) -> Decimal {
        self.glosa.rejected_value
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn category(&self) -> GlosaCategory {
        self.classification.category
    }

    pub fn action(&self) -> SuggestedAction {
        self.classification.action
    }

    pub fn automatable(&self) -> bool {
        self.classification.automatable
    }

    pub fn status(&self) -> GlosaStatus {
        self.status
    }

    /// Whether an appeal was ever sent, including appeals later lost
    pub fn appealed(&self) -> bool {
        self.appealed
    }

    /// Move to `next`. Staying in the current status is a no-op.
    pub fn transition(&mut self, next: GlosaStatus) -> GlosaResult<()> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_move_to(next) {
            return Err(GlosaError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        debug!(code = %self.glosa.code, from = ?self.status, to = ?next, "glosa status changed");
        self.status = next;
        if next == GlosaStatus::AppealSent {
            self.appealed = true;
        }
        Ok(())
    }
}
