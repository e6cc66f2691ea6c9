use crate::builder::{split_into_lots, BuilderConfig};
use crate::error::BillingResult;
use crate::models::Guide;
use crate::registry::Registries;
use crate::validator::ValidationReport;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// A built lot with its pre-flight validation result
#[derive(Debug, Clone, Serialize)]
pub struct PreparedLot {
    pub lot_id: String,
    pub guides: usize,
    pub document: String,
    pub report: ValidationReport,
}

impl PreparedLot {
    pub fn is_valid(&self) -> bool {
        self.report.valid
    }
}

/// Billing service
///
/// Resolves the builder and validator for a provider's configuration and runs the
/// split, build and pre-flight steps over a batch of guides.
#[derive(Debug, Clone)]
pub struct BillingService {
    registries: Arc<Registries>,
    config: BuilderConfig,
}

impl BillingService {
    /// Create a billing service for one provider and protocol version
    pub fn new(registries: Arc<Registries>, config: BuilderConfig) -> Self {
        Self { registries, config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Split `guides` into lots, build each one and validate the result.
    ///
    /// Invalid lots are returned with their report rather than as an error so the caller can
    /// decide which to send.
    pub fn prepare_lots(&self, guides: Vec<Guide>, prefix: &str) -> BillingResult<Vec<PreparedLot>> {
        let builder = self.registries.builder(&self.config)?;
        let validator = self.registries.validator(&self.config)?;

        let lots = split_into_lots(guides, prefix)?;
        let mut prepared = Vec::with_capacity(lots.len());
        for lot in &lots {
            let document = builder.build_lot(lot)?;
            let report = validator.validate(&document)?;
            if !report.valid {
                warn!(
                    lot = lot.id(),
                    errors = report.errors.len(),
                    "lot failed pre-flight validation"
                );
            }
            prepared.push(PreparedLot {
                lot_id: lot.id().to_string(),
                guides: lot.len(),
                document,
                report,
            });
        }

        info!(
            lots = prepared.len(),
            valid = prepared.iter().filter(|p| p.is_valid()).count(),
            version = %self.config.version,
            "lots prepared"
        );
        Ok(prepared)
    }
}
