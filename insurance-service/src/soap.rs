//! SOAP envelope construction
//!
//! The TISS document is signed before it gets here; the envelope wraps it unchanged apart from
//! dropping its XML declaration, which cannot appear inside another element.

use crate::config::{Credentials, EndpointConfig};
use crate::error::{InsuranceError, InsuranceResult};
use quick_xml::escape::escape;
use secrecy::ExposeSecret;

const SOAP_PREFIX: &str = "soap";
const OPERATION_PREFIX: &str = "tiss";

/// Payload without a leading `<?xml ...?>` declaration
fn strip_declaration(payload: &str) -> &str {
    let trimmed = payload.trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return trimmed.get(end + 2..).unwrap_or_default().trim_start();
        }
    }
    trimmed
}

fn auth_header(credentials: &Credentials) -> String {
    let mut header = format!(
        "<{p}:loginSenhaPrestador><{p}:loginPrestador>{}</{p}:loginPrestador><{p}:senhaPrestador>{}</{p}:senhaPrestador>",
        escape(credentials.login.as_str()),
        escape(credentials.password.expose_secret().as_str()),
        p = OPERATION_PREFIX,
    );
    if let Some(code) = &credentials.provider_code {
        header.push_str(&format!(
            "<{p}:codigoPrestadorNaOperadora>{}</{p}:codigoPrestadorNaOperadora>",
            escape(code.as_str()),
            p = OPERATION_PREFIX,
        ));
    }
    header.push_str(&format!("</{}:loginSenhaPrestador>", OPERATION_PREFIX));
    header
}

/// Wrap a signed TISS document in a SOAP envelope for `endpoint`
pub fn envelope(
    endpoint: &EndpointConfig,
    credentials: Option<&Credentials>,
    payload: &str,
) -> InsuranceResult<String> {
    let header = if endpoint.requires_auth_header {
        let credentials = credentials.ok_or_else(|| {
            InsuranceError::Config("authentication header required but no credentials".to_string())
        })?;
        auth_header(credentials)
    } else {
        String::new()
    };

    Ok(format!(
        concat!(
            r#"<?xml version="1.0" encoding="ISO-8859-1"?>"#,
            r#"<{s}:Envelope xmlns:{s}="{soap_ns}" xmlns:{t}="{op_ns}">"#,
            "<{s}:Header>{header}</{s}:Header>",
            "<{s}:Body>{body}</{s}:Body>",
            "</{s}:Envelope>"
        ),
        s = SOAP_PREFIX,
        t = OPERATION_PREFIX,
        soap_ns = endpoint.soap_version.envelope_namespace(),
        op_ns = escape(endpoint.namespace.as_str()),
        header = header,
        body = strip_declaration(payload),
    ))
}
