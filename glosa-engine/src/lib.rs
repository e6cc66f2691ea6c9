//! Glosa Classification Engine
//!
//! Turns payer rejections into work: every rejection code is mapped to a category and a
//! suggested action through a swappable [`GlosaTable`], return documents are parsed into
//! classified records with an overall outcome, and record sets are summarised into statistics
//! and a prioritised action plan.
//!
//! ```
//! use glosa_engine::{GlosaCategory, GlosaTable, SuggestedAction};
//!
//! let table = GlosaTable::default();
//! let c = table.classify("2010");
//! assert_eq!(c.category, GlosaCategory::Technical);
//! assert_eq!(c.action, SuggestedAction::Resubmit);
//! assert!(c.automatable);
//! ```

pub mod actions;
pub mod classifier;
pub mod error;
pub mod returns;
pub mod stats;
pub mod table;

pub use actions::*;
pub use classifier::*;
pub use error::*;
pub use returns::*;
pub use stats::*;
pub use table::*;
