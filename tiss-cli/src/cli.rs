use billing_service::{ProtocolVersion, TransactionKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TISS billing operations
#[derive(Parser, Debug)]
#[command(name = "tiss")]
#[command(about = "Digest, validate, analyse and submit TISS billing messages")]
pub struct Cli {
    /// Configuration file (TOML or YAML)
    #[arg(short, long, env = "TISS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the digest of a document, ignoring any epilogue it already carries
    Hash {
        file: PathBuf,
    },

    /// Compare the embedded digest with the recomputed one
    Verify {
        file: PathBuf,
    },

    /// Run structural and business-rule validation
    Validate {
        file: PathBuf,

        /// Validate as this version instead of the one declared in the document
        #[arg(long, value_parser = parse_version)]
        version: Option<ProtocolVersion>,
    },

    /// Print the protocol version declared in a document
    Detect {
        file: PathBuf,
    },

    /// Classify rejection codes
    Classify {
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Parse a payer return document and plan the follow-up work
    ParseReturn {
        file: PathBuf,

        /// Number of codes kept in the top-codes ranking
        #[arg(long, default_value_t = glosa_engine::DEFAULT_TOP_CODES)]
        top: usize,
    },

    /// Send a signed document to the configured payer endpoint
    SendLot {
        file: PathBuf,

        /// Transaction to perform
        #[arg(long, value_enum, default_value = "lot")]
        kind: Transaction,

        /// Send even when local validation reports errors
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transaction {
    Lot,
    Procedure,
    Eligibility,
    Status,
    Appeal,
}

impl From<Transaction> for TransactionKind {
    fn from(value: Transaction) -> Self {
        match value {
            Transaction::Lot => TransactionKind::LotSubmission,
            Transaction::Procedure => TransactionKind::ProcedureRequest,
            Transaction::Eligibility => TransactionKind::EligibilityCheck,
            Transaction::Status => TransactionKind::ProtocolStatus,
            Transaction::Appeal => TransactionKind::GlosaAppeal,
        }
    }
}

fn parse_version(s: &str) -> Result<ProtocolVersion, String> {
    s.parse().map_err(|e: billing_service::BillingError| e.to_string())
}
