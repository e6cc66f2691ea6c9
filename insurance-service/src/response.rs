use crate::error::{InsuranceError, InsuranceResult};
use billing_service::wire::read_glosas;
use billing_service::Glosa;
use chrono::NaiveDate;
use integrity_engine::tree::{self, Element};
use serde::Serialize;

/// Result of one transaction with the payer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionOutcome {
    pub success: bool,
    pub protocol_number: Option<String>,
    pub protocol_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub response_body: Option<String>,
    pub errors: Vec<String>,
    pub glosas: Vec<Glosa>,
    /// Eligibility answers only
    pub eligible: Option<bool>,
    pub plan_name: Option<String>,
}

/// `(code, message)` of a SOAP fault anywhere in the response, 1.1 or 1.2 layout
pub fn find_fault(root: &Element) -> Option<(String, String)> {
    let fault = std::iter::once(root)
        .chain(root.descendants())
        .find(|e| e.local_name == "Fault")?;

    let code = fault
        .text_of("faultcode")
        .or_else(|| fault.find("Code").and_then(|c| c.text_of("Value")))
        .unwrap_or("Server");
    let message = fault
        .text_of("faultstring")
        .or_else(|| fault.find("Reason").and_then(|r| r.text_of("Text")))
        .unwrap_or("unspecified fault");
    Some((code.to_string(), message.to_string()))
}

/// Fault check for a raw body; bodies that are not XML are not faults
pub fn fault_in(body: &str) -> Option<InsuranceError> {
    let parsed = tree::parse(body).ok()?;
    find_fault(&parsed.root).map(|(code, message)| InsuranceError::RemoteFault { code, message })
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_uppercase().as_str() {
        "S" | "SIM" | "TRUE" | "1" => Some(true),
        "N" | "NAO" | "N\u{c3}O" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

/// Read a successful SOAP answer
pub fn parse_response(body: &str) -> InsuranceResult<TransactionOutcome> {
    let parsed = tree::parse(body).map_err(|e| InsuranceError::InvalidResponse(e.to_string()))?;
    if let Some((code, message)) = find_fault(&parsed.root) {
        return Err(InsuranceError::RemoteFault { code, message });
    }

    let content = parsed
        .root
        .find("Body")
        .unwrap_or(&parsed.root);

    let errors: Vec<String> = content
        .find_all("mensagemErro")
        .into_iter()
        .map(|e| {
            let code = e.text_of("codigoGlosa").unwrap_or("?");
            match e.text_of("descricaoGlosa") {
                Some(description) => format!("{}: {}", code, description),
                None => code.to_string(),
            }
        })
        .collect();

    let protocol_date = ["dataEnvioLote", "dataProtocolo", "dataRegistroTransacao"]
        .iter()
        .find_map(|name| content.text_of(name))
        .and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok());

    let glosas = read_glosas(content).map_err(|e| InsuranceError::InvalidResponse(e.to_string()))?;

    Ok(TransactionOutcome {
        success: errors.is_empty(),
        protocol_number: content.text_of("numeroProtocolo").map(str::to_string),
        protocol_date,
        status: content
            .text_of("statusProtocolo")
            .or_else(|| content.text_of("situacaoProtocolo"))
            .map(str::to_string),
        response_body: Some(body.to_string()),
        errors,
        glosas,
        eligible: content
            .text_of("respostaSolicitacao")
            .or_else(|| content.text_of("elegivel"))
            .and_then(parse_flag),
        plan_name: content.text_of("nomePlano").map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn soap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="ISO-8859-1"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{}</soap:Body></soap:Envelope>"#,
            body
        )
    }

    #[test]
    fn test_protocol_receipt() {
        let body = soap(
            "<ans:protocoloRecebimento xmlns:ans=\"x\"><ans:numeroProtocolo>12345</ans:numeroProtocolo>\
             <ans:dataEnvioLote>2024-03-11</ans:dataEnvioLote><ans:statusProtocolo>1</ans:statusProtocolo></ans:protocoloRecebimento>",
        );
        let outcome = parse_response(&body).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.protocol_number.as_deref(), Some("12345"));
        assert_eq!(outcome.protocol_date, NaiveDate::from_ymd_opt(2024, 3, 11));
        assert_eq!(outcome.status.as_deref(), Some("1"));
        assert!(outcome.glosas.is_empty());
    }

    #[test]
    fn test_error_messages_and_glosas() {
        let body = soap(
            "<mensagemErro><codigoGlosa>1307</codigoGlosa><descricaoGlosa>Guia invalida</descricaoGlosa></mensagemErro>\
             <glosa><codigoGlosa>2010</codigoGlosa><valorGlosa>12,50</valorGlosa></glosa>",
        );
        let outcome = parse_response(&body).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.errors, vec!["1307: Guia invalida".to_string()]);
        assert_eq!(outcome.glosas.len(), 2);
        assert_eq!(outcome.glosas[1].rejected_value, Decimal::new(1250, 2));
    }

    #[test]
    fn test_eligibility_answer() {
        let body = soap(
            "<respostaElegibilidade><respostaSolicitacao>S</respostaSolicitacao><nomePlano>Plano Ouro</nomePlano></respostaElegibilidade>",
        );
        let outcome = parse_response(&body).unwrap();
        assert_eq!(outcome.eligible, Some(true));
        assert_eq!(outcome.plan_name.as_deref(), Some("Plano Ouro"));
    }

    #[test]
    fn test_faults_in_both_layouts() {
        let v11 = soap("<soap:Fault><faultcode>soap:Client</faultcode><faultstring>Lote duplicado</faultstring></soap:Fault>");
        assert!(matches!(
            parse_response(&v11),
            Err(InsuranceError::RemoteFault { code, message }) if code == "soap:Client" && message == "Lote duplicado"
        ));

        let v12 = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><env:Fault>
            <env:Code><env:Value>env:Sender</env:Value></env:Code>
            <env:Reason><env:Text xml:lang="pt">Hash invalido</env:Text></env:Reason>
            </env:Fault></env:Body></env:Envelope>"#;
        assert!(matches!(
            fault_in(v12),
            Some(InsuranceError::RemoteFault { code, message }) if code == "env:Sender" && message == "Hash invalido"
        ));
        assert!(fault_in("<html>Bad gateway</html>").is_none());
        assert!(fault_in("not xml at all").is_none());
    }

    #[test]
    fn test_unparsable_glosa_value_fails_the_response() {
        let body = soap("<glosa><codigoGlosa>2010</codigoGlosa><valorGlosa>doze</valorGlosa></glosa>");
        assert!(matches!(
            parse_response(&body),
            Err(InsuranceError::InvalidResponse(message)) if message.contains("doze")
        ));
    }
}
