//! Integrity Engine for TISS documents
//!
//! Every TISS message ends with an `epilogo` element holding an MD5 digest of the message's
//! text content. This crate computes, embeds and verifies that digest, and provides the
//! Latin-1 helpers the digest depends on.
//!
//! # Example
//!
//! ```rust
//! use integrity_engine::{embed, verify};
//!
//! let doc = r#"<ans:mensagemTISS xmlns:ans="http://www.ans.gov.br/padroes/tiss/schemas"><ans:Padrao>4.01.00</ans:Padrao></ans:mensagemTISS>"#;
//! let signed = embed(doc).unwrap();
//! assert!(verify(&signed).unwrap().matches);
//! ```

pub mod digest;
pub mod encoding;
pub mod error;
pub mod tree;

pub use digest::*;
pub use encoding::*;
pub use error::*;
