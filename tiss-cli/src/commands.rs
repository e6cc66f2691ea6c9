use crate::cli::{Command, OutputFormat, Transaction};
use crate::settings::Settings;
use anyhow::{Context, Result};
use billing_service::{detect_version, ProtocolVersion, Registries, ValidationReport};
use glosa_engine::{compute_statistics, parse_return_document, partition_automatable, prioritize_actions};
use insurance_service::TissClient;
use logger_redacted::PiiRedactor;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, warn};

/// What a command produced and whether the process should report success
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub value: Value,
    pub success: bool,
}

impl CommandOutput {
    fn ok(value: impl Serialize) -> Result<Self> {
        Ok(Self {
            value: serde_json::to_value(value)?,
            success: true,
        })
    }

    fn check(value: impl Serialize, success: bool) -> Result<Self> {
        Ok(Self {
            value: serde_json::to_value(value)?,
            success,
        })
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => serde_json::to_string_pretty(&self.value)?,
            OutputFormat::Yaml => serde_yaml::to_string(&self.value)?,
        })
    }
}

/// Documents on disk are normally ISO-8859-1; UTF-8 files are accepted as they are
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => integrity_engine::decode_latin1(err.as_bytes()),
    })
}

/// Built-in registries; refuses to start when a version lacks a builder or a validator
pub fn load_registries() -> Result<Registries> {
    let registries = Registries::with_defaults();
    registries
        .ensure_complete()
        .context("incomplete protocol version registry")?;
    Ok(registries)
}

fn validate(
    doc: &str,
    version: ProtocolVersion,
    settings: &Settings,
    registries: &Registries,
) -> Result<ValidationReport> {
    let validator = registries.validator(&settings.builder_config(version))?;
    Ok(validator.validate(doc)?)
}

pub async fn run(
    command: Command,
    settings: &Settings,
    registries: &Registries,
    redactor: PiiRedactor,
) -> Result<CommandOutput> {
    match command {
        Command::Hash { file } => {
            let doc = read_document(&file)?;
            let digest = integrity_engine::digest_document(&doc)?;
            CommandOutput::ok(json!({ "digest": digest }))
        }
        Command::Verify { file } => {
            let doc = read_document(&file)?;
            let verification = integrity_engine::verify(&doc)?;
            CommandOutput::check(
                json!({
                    "matches": verification.matches,
                    "embedded": verification.embedded,
                    "computed": verification.computed,
                }),
                verification.matches,
            )
        }
        Command::Validate { file, version } => {
            let doc = read_document(&file)?;
            let version = version
                .or_else(|| detect_version(&doc))
                .context("document does not declare a supported version; pass --version")?;
            let report = validate(&doc, version, settings, registries)?;
            let valid = report.valid;
            CommandOutput::check(
                json!({ "version": version.label(), "report": report }),
                valid,
            )
        }
        Command::Detect { file } => {
            let doc = read_document(&file)?;
            let version = detect_version(&doc);
            CommandOutput::check(
                json!({ "version": version.map(|v| v.label()) }),
                version.is_some(),
            )
        }
        Command::Classify { codes } => {
            let table = settings.glosa_table()?;
            let classified: Vec<Value> = codes
                .iter()
                .map(|code| json!({ "code": code, "classification": table.classify(code) }))
                .collect();
            CommandOutput::ok(classified)
        }
        Command::ParseReturn { file, top } => {
            let doc = read_document(&file)?;
            let table = settings.glosa_table()?;
            let statement = parse_return_document(&doc, &table)?;
            let statistics = compute_statistics(&statement.glosas, top);
            let actions = prioritize_actions(&statement.glosas);
            let partition = partition_automatable(statement.glosas.iter().cloned());
            CommandOutput::ok(json!({
                "statement": statement,
                "statistics": statistics,
                "actions": actions,
                "automatable": partition.automatable.len(),
                "manual": partition.manual.len(),
            }))
        }
        Command::SendLot { file, kind, force } => {
            send(&file, kind, force, settings, registries, redactor).await
        }
    }
}

async fn send(
    file: &Path,
    kind: Transaction,
    force: bool,
    settings: &Settings,
    registries: &Registries,
    redactor: PiiRedactor,
) -> Result<CommandOutput> {
    let doc = read_document(file)?;

    if let Some(version) = detect_version(&doc) {
        let report = validate(&doc, version, settings, registries)?;
        if !report.valid {
            if !force {
                return CommandOutput::check(
                    json!({ "sent": false, "version": version.label(), "report": report }),
                    false,
                );
            }
            warn!(errors = report.errors.len(), "sending a document that failed validation");
        }
    } else if !force {
        anyhow::bail!("document does not declare a supported version; use --force to send anyway");
    }

    let client = TissClient::new(settings.transport_config()?)?.with_redactor(redactor);
    let outcome = client.send(kind.into(), &doc).await;
    client.close();

    let outcome = outcome?;
    info!(
        success = outcome.success,
        protocol = outcome.protocol_number.as_deref().unwrap_or("-"),
        "payer answered"
    );
    let success = outcome.success;
    CommandOutput::check(json!({ "sent": true, "outcome": outcome }), success)
}
