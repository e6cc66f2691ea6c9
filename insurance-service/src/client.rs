//! Transport Client
//!
//! One `TissClient` per payer endpoint. Every transaction goes through [`TissClient::send`]:
//! wrap in a SOAP envelope, encode as Latin-1, post, and retry connection failures, timeouts
//! and 5xx answers with exponential backoff. Remote faults and 4xx answers end the call at once.

use crate::config::TransportConfig;
use crate::error::{InsuranceError, InsuranceResult};
use crate::identity::load_identity;
use crate::response::{fault_in, parse_response, TransactionOutcome};
use crate::soap;
use billing_service::TransactionKind;
use integrity_engine::{decode_latin1, encode_latin1};
use logger_redacted::PiiRedactor;
use reqwest::header::CONTENT_TYPE;
use reqwest::tls;
use tracing::{debug, info, warn};

pub struct TissClient {
    http: reqwest::Client,
    config: TransportConfig,
    redactor: PiiRedactor,
}

impl std::fmt::Debug for TissClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TissClient")
            .field("endpoint", &self.config.endpoint.url)
            .field("soap_version", &self.config.endpoint.soap_version)
            .finish()
    }
}

impl TissClient {
    /// Create a client, loading the client certificate when one is configured
    pub fn new(config: TransportConfig) -> InsuranceResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .min_tls_version(tls::Version::TLS_1_2)
            .timeout(config.retry.attempt_timeout);

        if let Some(certificate) = &config.certificate {
            builder = builder.identity(load_identity(certificate)?);
        }

        let http = builder.build()?;
        info!(
            endpoint = %config.endpoint.url,
            soap = ?config.endpoint.soap_version,
            mutual_tls = config.certificate.is_some(),
            "transport client ready"
        );

        Ok(Self {
            http,
            config,
            redactor: PiiRedactor::default(),
        })
    }

    /// Use `redactor` for envelope logging
    pub fn with_redactor(mut self, redactor: PiiRedactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Send a signed document as `kind`, retrying within the configured budget
    pub async fn send(&self, kind: TransactionKind, payload: &str) -> InsuranceResult<TransactionOutcome> {
        let envelope = soap::envelope(
            &self.config.endpoint,
            self.config.credentials.as_ref(),
            payload,
        )?;
        let body = encode_latin1(&envelope)?;
        debug!(
            operation = kind.operation(),
            envelope = %self.redactor.redact(&envelope),
            "outbound envelope"
        );

        let policy = self.config.retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(kind, body.clone()).await {
                Ok(outcome) => {
                    info!(
                        operation = kind.operation(),
                        attempt,
                        success = outcome.success,
                        protocol = outcome.protocol_number.as_deref().unwrap_or("-"),
                        "transaction completed"
                    );
                    return Ok(outcome);
                }
                Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        operation = kind.operation(),
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_retryable() => {
                    warn!(operation = kind.operation(), attempt, error = %err, "retry budget exhausted");
                    return Err(InsuranceError::RetriesExhausted {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(operation = kind.operation(), attempt, error = %err, "transaction failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, kind: TransactionKind, body: Vec<u8>) -> InsuranceResult<TransactionOutcome> {
        let action = kind.operation();
        let mut request = self
            .http
            .post(&self.config.endpoint.url)
            .header(
                CONTENT_TYPE,
                self.config.endpoint.soap_version.content_type(action),
            )
            .body(body);
        if self.config.endpoint.soap_version == crate::config::SoapVersion::V1_1 {
            request = request.header("SOAPAction", format!("\"{}\"", action));
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let text = decode_latin1(&bytes);
        debug!(
            operation = action,
            status = status.as_u16(),
            envelope = %self.redactor.redact(&text),
            "inbound envelope"
        );

        if let Some(fault) = fault_in(&text) {
            return Err(fault);
        }
        if status.is_server_error() {
            return Err(InsuranceError::Transport(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(InsuranceError::HttpStatus {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }

        parse_response(&text)
    }

    /// `ENVIO_LOTE_GUIAS`
    pub async fn submit_lot(&self, document: &str) -> InsuranceResult<TransactionOutcome> {
        self.send(TransactionKind::LotSubmission, document).await
    }

    /// `SOLICITACAO_PROCEDIMENTOS`
    pub async fn submit_procedure_request(&self, document: &str) -> InsuranceResult<TransactionOutcome> {
        self.send(TransactionKind::ProcedureRequest, document).await
    }

    /// `VERIFICA_ELEGIBILIDADE`; the outcome carries `eligible` and `plan_name`
    pub async fn check_eligibility(&self, document: &str) -> InsuranceResult<TransactionOutcome> {
        self.send(TransactionKind::EligibilityCheck, document).await
    }

    /// `SOLICITA_STATUS_PROTOCOLO`
    pub async fn query_protocol(&self, document: &str) -> InsuranceResult<TransactionOutcome> {
        self.send(TransactionKind::ProtocolStatus, document).await
    }

    /// `RECURSO_GLOSA`
    pub async fn submit_glosa_appeal(&self, document: &str) -> InsuranceResult<TransactionOutcome> {
        self.send(TransactionKind::GlosaAppeal, document).await
    }

    /// Release pooled connections
    pub fn close(self) {
        info!(endpoint = %self.config.endpoint.url, "transport client closed");
        drop(self.http);
    }
}
