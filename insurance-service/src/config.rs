use crate::error::{InsuranceError, InsuranceResult};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_NAMESPACE: &str = "http://www.ans.gov.br/padroes/tiss/schemas";

/// SOAP envelope flavour expected by the payer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoapVersion {
    #[default]
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "1.2")]
    V1_2,
}

impl SoapVersion {
    pub fn envelope_namespace(&self) -> &'static str {
        match self {
            SoapVersion::V1_1 => "http://schemas.xmlsoap.org/soap/envelope/",
            SoapVersion::V1_2 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }

    /// `Content-Type` header for a request invoking `action`
    pub fn content_type(&self, action: &str) -> String {
        match self {
            SoapVersion::V1_1 => "text/xml; charset=ISO-8859-1".to_string(),
            SoapVersion::V1_2 => format!(
                "application/soap+xml; charset=ISO-8859-1; action=\"{}\"",
                action
            ),
        }
    }
}

impl FromStr for SoapVersion {
    type Err = InsuranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.1" | "11" => Ok(SoapVersion::V1_1),
            "1.2" | "12" => Ok(SoapVersion::V1_2),
            other => Err(InsuranceError::Config(format!(
                "unknown SOAP version '{}'",
                other
            ))),
        }
    }
}

/// Payer web service endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub url: String,
    /// Namespace of the payer's operation elements
    pub namespace: String,
    /// Payer expects a `loginSenhaPrestador` header block
    pub requires_auth_header: bool,
    pub soap_version: SoapVersion,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            requires_auth_header: false,
            soap_version: SoapVersion::default(),
        }
    }
}

/// Provider login for the authentication header
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: SecretString,
    pub provider_code: Option<String>,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::new(password.into()),
            provider_code: None,
        }
    }
}

/// Client certificate for mutual TLS: one PEM file holding the certificate chain and the
/// private key, plain or passphrase-protected PKCS#8
#[derive(Debug, Clone)]
pub struct ClientCertificate {
    pub pem_path: PathBuf,
    pub passphrase: Option<SecretString>,
}

impl ClientCertificate {
    pub fn new(pem_path: impl Into<PathBuf>) -> Self {
        Self {
            pem_path: pem_path.into(),
            passphrase: None,
        }
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(SecretString::new(passphrase.into()));
        self
    }
}

/// Retry budget for one `send`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Per-attempt timeout covering connect, request and response body
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Everything needed to build a [`TissClient`](crate::TissClient)
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub endpoint: EndpointConfig,
    pub credentials: Option<Credentials>,
    pub certificate: Option<ClientCertificate>,
    pub retry: RetryPolicy,
}

impl TransportConfig {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            credentials: None,
            certificate: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Configuration from `TISS_*` environment variables
    pub fn from_env() -> InsuranceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from any key lookup using the `TISS_*` names
    pub fn from_lookup<F>(lookup: F) -> InsuranceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("TISS_ENDPOINT_URL").ok_or_else(|| {
            InsuranceError::Config("TISS_ENDPOINT_URL is required".to_string())
        })?;
        let mut endpoint = EndpointConfig::new(url);

        if let Some(namespace) = lookup("TISS_NAMESPACE") {
            endpoint.namespace = namespace;
        }
        if let Some(version) = lookup("TISS_SOAP_VERSION") {
            endpoint.soap_version = version.parse()?;
        }
        endpoint.requires_auth_header = lookup("TISS_AUTH_HEADER")
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        let credentials = match (lookup("TISS_LOGIN"), lookup("TISS_PASSWORD")) {
            (Some(login), Some(password)) => Some(Credentials {
                provider_code: lookup("TISS_PROVIDER_CODE"),
                ..Credentials::new(login, password)
            }),
            (Some(_), None) | (None, Some(_)) => {
                return Err(InsuranceError::Config(
                    "TISS_LOGIN and TISS_PASSWORD must be set together".to_string(),
                ))
            }
            (None, None) => None,
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: lookup("TISS_MAX_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
            base_delay: lookup("TISS_RETRY_BASE_MS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.base_delay, Duration::from_millis),
            max_delay: defaults.max_delay,
            attempt_timeout: lookup("TISS_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.attempt_timeout, Duration::from_secs),
        };

        let config = Self {
            endpoint,
            credentials,
            certificate: lookup("TISS_CLIENT_CERT").map(|path| {
                let certificate = ClientCertificate::new(path);
                match lookup("TISS_CLIENT_CERT_PASSPHRASE") {
                    Some(passphrase) => certificate.with_passphrase(passphrase),
                    None => certificate,
                }
            }),
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> InsuranceResult<()> {
        let url = self.endpoint.url.as_str();
        if url.starts_with("http://") {
            warn!(url, "endpoint is not using TLS");
        } else if !url.starts_with("https://") {
            return Err(InsuranceError::Config(format!(
                "endpoint '{}' must be an http(s) URL",
                url
            )));
        }
        if self.endpoint.requires_auth_header && self.credentials.is_none() {
            return Err(InsuranceError::Config(
                "endpoint requires an authentication header but no credentials are set".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(InsuranceError::Config(
                "retry budget must allow at least one attempt".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config =
            TransportConfig::from_lookup(lookup(&[("TISS_ENDPOINT_URL", "https://payer.example/ws")]))
                .unwrap();
        assert_eq!(config.endpoint.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.endpoint.soap_version, SoapVersion::V1_1);
        assert!(config.credentials.is_none());
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_from_lookup_full() {
        let config = TransportConfig::from_lookup(lookup(&[
            ("TISS_ENDPOINT_URL", "https://payer.example/ws"),
            ("TISS_SOAP_VERSION", "1.2"),
            ("TISS_AUTH_HEADER", "true"),
            ("TISS_LOGIN", "clinica"),
            ("TISS_PASSWORD", "s3cr3t"),
            ("TISS_PROVIDER_CODE", "PREST001"),
            ("TISS_MAX_ATTEMPTS", "5"),
            ("TISS_RETRY_BASE_MS", "10"),
            ("TISS_CLIENT_CERT", "/etc/tiss/client.pem"),
            ("TISS_CLIENT_CERT_PASSPHRASE", "senha-forte"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.soap_version, SoapVersion::V1_2);
        assert!(config.endpoint.requires_auth_header);
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.password.expose_secret(), "s3cr3t");
        assert_eq!(credentials.provider_code.as_deref(), Some("PREST001"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(10));
        let certificate = config.certificate.unwrap();
        assert_eq!(certificate.pem_path, PathBuf::from("/etc/tiss/client.pem"));
        assert_eq!(
            certificate.passphrase.map(|p| p.expose_secret().clone()).as_deref(),
            Some("senha-forte")
        );
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(TransportConfig::from_lookup(lookup(&[])).is_err());
        assert!(TransportConfig::from_lookup(lookup(&[
            ("TISS_ENDPOINT_URL", "https://payer.example/ws"),
            ("TISS_AUTH_HEADER", "true"),
        ]))
        .is_err());
        assert!(TransportConfig::from_lookup(lookup(&[
            ("TISS_ENDPOINT_URL", "ftp://payer.example"),
        ]))
        .is_err());
        assert!(TransportConfig::from_lookup(lookup(&[
            ("TISS_ENDPOINT_URL", "https://payer.example/ws"),
            ("TISS_LOGIN", "clinica"),
        ]))
        .is_err());
        assert!(TransportConfig::from_lookup(lookup(&[
            ("TISS_ENDPOINT_URL", "https://payer.example/ws"),
            ("TISS_SOAP_VERSION", "2.0"),
        ]))
        .is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(40), Duration::from_millis(350));
    }
}
