//! Billing Service for TISS electronic billing
//!
//! Provides the provider side of the exchange with health-plan payers:
//! - Guide, lot and ancillary transaction data model
//! - Message builders per protocol version, signed through the integrity engine
//! - Two-phase message validation (structure, then business rules)
//! - Version registry with cached per-provider instances
//! - Lot splitting and pre-flight preparation
//!
//! ```no_run
//! use billing_service::{BillingService, BuilderConfig, Registries};
//! use std::sync::Arc;
//!
//! # fn run(config: BuilderConfig, guides: Vec<billing_service::Guide>) -> billing_service::BillingResult<()> {
//! let registries = Arc::new(Registries::with_defaults());
//! registries.ensure_complete()?;
//!
//! let service = BillingService::new(registries, config);
//! for lot in service.prepare_lots(guides, "LOTE")? {
//!     println!("{} valid={}", lot.lot_id, lot.is_valid());
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod models;
pub mod money;
pub mod registry;
pub mod service;
pub mod validator;
pub mod version;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{
    lot_id, split_into_lots, BuilderConfig, MessageBuilder, TissMessageBuilder, MAX_LOT_SEQUENCE,
};
pub use error::*;
pub use models::*;
pub use money::{format_money, parse_money};
pub use registry::{Registries, Registry};
pub use service::*;
pub use validator::{MessageValidator, TissValidator, ValidationReport};
pub use version::*;
