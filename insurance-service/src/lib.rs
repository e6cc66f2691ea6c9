//! Insurance Service for TISS payer communication
//!
//! Provides the transport side of the exchange with health-plan payers:
//! - SOAP 1.1 / 1.2 envelopes with the optional provider login header
//! - TLS 1.2+ transport with optional mutual-TLS client certificate
//! - Bounded retries with exponential backoff for transient failures
//! - Response parsing: faults, protocol receipts, glosas, eligibility answers
//!
//! All bytes on the wire are ISO-8859-1 in both directions.

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod response;
pub mod soap;

pub use client::*;
pub use config::*;
pub use error::*;
pub use response::{parse_response, TransactionOutcome};
