//! Operator CLI for TISS billing
//!
//! Wires the integrity engine, the per-version validators, the glosa engine and the payer
//! transport behind one `tiss` binary.
//!
//! ```bash
//! tiss hash lote.xml
//! tiss validate lote.xml --version 4.01.00
//! tiss classify 2010 1705
//! tiss --format yaml parse-return retorno.xml
//! TISS__TRANSPORT__URL=https://payer.example/tiss tiss send-lot lote.xml
//! ```

pub mod cli;
pub mod commands;
pub mod settings;

pub use cli::{Cli, Command, OutputFormat, Transaction};
pub use commands::{load_registries, run, CommandOutput};
pub use settings::{Settings, TransportSettings};
