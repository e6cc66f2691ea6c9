//! Common error handling utilities for the TISS engine
//!
//! Every crate in the workspace defines its own `thiserror` enum for hard failures. What they
//! share is the vocabulary for recoverable findings: stable error codes and the
//! [`ValidationIssue`] record the validator returns instead of raising.
//!
//! # Code Groups
//!
//! - **structure**: envelope, header and epilogue problems (`TISS_S*`)
//! - **rules**: field formats, digest and monetary checks (`TISS_R*`)
//! - **warnings**: non-fatal findings (`TISS_W*`)
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ValidationIssue};
//!
//! let issue = ValidationIssue::error(codes::rules::INVALID_REGISTRY_ID, "expected 6 digits")
//!     .with_field("registroANS");
//! assert!(issue.is_error());
//! ```

pub mod codes;
pub mod types;

pub use types::*;
