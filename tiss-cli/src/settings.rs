//! Layered CLI settings: optional file, then `TISS__*` environment variables.
//!
//! ```text
//! TISS__LOGGING__LOG_LEVEL=debug
//! TISS__TRANSPORT__URL=https://payer.example/tiss
//! TISS__TRANSPORT__LOGIN=clinica
//! ```

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use billing_service::{BuilderConfig, ProtocolVersion, Provider};
use glosa_engine::GlosaTable;
use insurance_service::{
    ClientCertificate, Credentials, EndpointConfig, RetryPolicy, TransportConfig,
};
use logger_redacted::LoggerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggerConfig,
    pub transport: Option<TransportSettings>,
    /// JSON file with payer-specific glosa rules merged over the built-in table
    pub glosa_table: Option<PathBuf>,
    /// Provider the registries build instances for; validation alone works without one
    pub provider: Option<Provider>,
    /// Payer `registroANS`
    pub payer_registry_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub url: String,
    pub namespace: Option<String>,
    pub soap_version: Option<String>,
    pub auth_header: bool,
    pub login: Option<String>,
    pub password: Option<String>,
    pub provider_code: Option<String>,
    pub client_cert: Option<PathBuf>,
    /// Passphrase of an encrypted client key
    pub client_cert_passphrase: Option<String>,
    pub max_attempts: Option<u32>,
    pub retry_base_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("TISS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("failed to load settings")?;

        settings
            .try_deserialize()
            .context("invalid settings")
    }

    /// Built-in glosa table, extended with the configured payer rules
    pub fn glosa_table(&self) -> Result<GlosaTable> {
        let mut table = GlosaTable::default();
        if let Some(path) = &self.glosa_table {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read glosa table {}", path.display()))?;
            table
                .extend_from_json(&json)
                .with_context(|| format!("invalid glosa table {}", path.display()))?;
        }
        Ok(table)
    }

    /// Registry key for `version` and the configured provider
    pub fn builder_config(&self, version: ProtocolVersion) -> BuilderConfig {
        let provider = self.provider.clone().unwrap_or_else(|| Provider {
            tax_id: String::new(),
            payer_code: None,
            name: String::new(),
            cnes: None,
        });
        BuilderConfig {
            version,
            provider,
            payer_registry_id: self.payer_registry_id.clone().unwrap_or_default(),
        }
    }

    pub fn transport_config(&self) -> Result<TransportConfig> {
        let Some(transport) = &self.transport else {
            bail!("no transport configured; set TISS__TRANSPORT__URL or a [transport] section");
        };
        transport.to_config()
    }
}

impl TransportSettings {
    pub fn to_config(&self) -> Result<TransportConfig> {
        let mut endpoint = EndpointConfig::new(self.url.clone());
        if let Some(namespace) = &self.namespace {
            endpoint.namespace = namespace.clone();
        }
        if let Some(version) = &self.soap_version {
            endpoint.soap_version = version.parse()?;
        }
        endpoint.requires_auth_header = self.auth_header;

        let credentials = match (&self.login, &self.password) {
            (Some(login), Some(password)) => Some(Credentials {
                provider_code: self.provider_code.clone(),
                ..Credentials::new(login.clone(), password.clone())
            }),
            (None, None) => None,
            _ => bail!("transport login and password must be set together"),
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay: self
                .retry_base_ms
                .map_or(defaults.base_delay, Duration::from_millis),
            max_delay: defaults.max_delay,
            attempt_timeout: self
                .timeout_secs
                .map_or(defaults.attempt_timeout, Duration::from_secs),
        };

        let config = TransportConfig {
            endpoint,
            credentials,
            certificate: self.client_cert.clone().map(|path| {
                let certificate = ClientCertificate::new(path);
                match &self.client_cert_passphrase {
                    Some(passphrase) => certificate.with_passphrase(passphrase.clone()),
                    None => certificate,
                }
            }),
            retry,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insurance_service::SoapVersion;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.logging.log_level, "info");
        assert!(settings.logging.redaction_enabled);
        assert!(settings.transport_config().is_err());
        assert_eq!(settings.glosa_table().unwrap(), GlosaTable::default());
    }

    #[test]
    fn test_load_yaml_file() {
        let path = std::env::temp_dir().join("tiss-cli-settings-test.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "logging:\n  log_level: debug\n  format: json\n  extra_wire_fields: [nomeProfissional]\ntransport:\n  url: https://payer.example/ws\n  soap_version: \"1.2\"\n  auth_header: true\n  login: clinica\n  password: s3cr3t\n  max_attempts: 5"
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.logging.log_level, "debug");
        assert_eq!(settings.logging.format, logger_redacted::LogFormat::Json);
        assert_eq!(settings.logging.extra_wire_fields, vec!["nomeProfissional".to_string()]);
        let config = settings.transport_config().unwrap();
        assert_eq!(config.endpoint.soap_version, SoapVersion::V1_2);
        assert!(config.endpoint.requires_auth_header);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.credentials.unwrap().login, "clinica");
    }

    #[test]
    fn test_client_certificate_passphrase_is_carried() {
        let transport = TransportSettings {
            url: "https://payer.example/ws".to_string(),
            client_cert: Some(PathBuf::from("/etc/tiss/client.pem")),
            client_cert_passphrase: Some("senha-forte".to_string()),
            ..Default::default()
        };
        let certificate = transport.to_config().unwrap().certificate.unwrap();
        assert_eq!(certificate.pem_path, PathBuf::from("/etc/tiss/client.pem"));
        assert!(certificate.passphrase.is_some());
    }

    #[test]
    fn test_half_credentials_are_rejected() {
        let transport = TransportSettings {
            url: "https://payer.example/ws".to_string(),
            login: Some("clinica".to_string()),
            ..Default::default()
        };
        assert!(transport.to_config().is_err());
    }

    #[test]
    fn test_payer_glosa_rules_are_merged() {
        let path = std::env::temp_dir().join("tiss-cli-glosa-table-test.json");
        std::fs::write(
            &path,
            r#"{"9420": {"category": "value", "action": "correct_values", "automatable": true}}"#,
        )
        .unwrap();

        let settings = Settings {
            glosa_table: Some(path.clone()),
            ..Default::default()
        };
        let table = settings.glosa_table().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), GlosaTable::default().len() + 1);
        assert!(table.lookup("9420").unwrap().automatable);
    }
}
