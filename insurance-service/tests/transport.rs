use insurance_service::*;
use mockito::{Matcher, Server};
use std::time::Duration;

const PROTOCOL_RECEIPT: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><ans:protocoloRecebimento xmlns:ans="http://www.ans.gov.br/padroes/tiss/schemas"><ans:numeroProtocolo>778899</ans:numeroProtocolo><ans:dataEnvioLote>2024-03-11</ans:dataEnvioLote></ans:protocoloRecebimento></soap:Body></soap:Envelope>"#;

const FAULT: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>soap:Client</faultcode><faultstring>Hash invalido</faultstring></soap:Fault></soap:Body></soap:Envelope>"#;

fn payload() -> String {
    integrity_engine::embed(
        r#"<?xml version="1.0" encoding="ISO-8859-1"?><ans:mensagemTISS xmlns:ans="http://www.ans.gov.br/padroes/tiss/schemas"><ans:cabecalho><ans:nomeContratado>Clínica São Lucas</ans:nomeContratado></ans:cabecalho></ans:mensagemTISS>"#,
    )
    .unwrap()
}

fn transport(url: String) -> TransportConfig {
    let mut config = TransportConfig::new(EndpointConfig::new(format!("{}/ws", url)));
    config.retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        attempt_timeout: Duration::from_secs(5),
    };
    config
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/ws")
        .with_status(500)
        .with_body("temporarily unavailable")
        .expect(2)
        .create_async()
        .await;
    let ok = server
        .mock("POST", "/ws")
        .with_status(200)
        .with_body(PROTOCOL_RECEIPT)
        .expect(1)
        .create_async()
        .await;

    let client = TissClient::new(transport(server.url())).unwrap();
    let outcome = client.submit_lot(&payload()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.protocol_number.as_deref(), Some("778899"));
    failing.assert_async().await;
    ok.assert_async().await;
    client.close();
}

#[tokio::test]
async fn remote_fault_is_never_retried() {
    let mut server = Server::new_async().await;
    let fault = server
        .mock("POST", "/ws")
        .with_status(500)
        .with_body(FAULT)
        .expect(1)
        .create_async()
        .await;

    let client = TissClient::new(transport(server.url())).unwrap();
    let err = client.submit_lot(&payload()).await.unwrap_err();

    assert!(matches!(
        err,
        InsuranceError::RemoteFault { ref code, ref message } if code == "soap:Client" && message == "Hash invalido"
    ));
    fault.assert_async().await;
}

#[tokio::test]
async fn client_errors_are_terminal() {
    let mut server = Server::new_async().await;
    let not_found = server
        .mock("POST", "/ws")
        .with_status(404)
        .with_body("no such service")
        .expect(1)
        .create_async()
        .await;

    let client = TissClient::new(transport(server.url())).unwrap();
    let err = client.query_protocol(&payload()).await.unwrap_err();

    assert!(matches!(err, InsuranceError::HttpStatus { status: 404, .. }));
    not_found.assert_async().await;
}

#[tokio::test]
async fn retry_budget_is_bounded() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("POST", "/ws")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let client = TissClient::new(transport(server.url())).unwrap();
    let err = client.submit_lot(&payload()).await.unwrap_err();

    assert!(matches!(err, InsuranceError::RetriesExhausted { attempts: 3, .. }));
    unavailable.assert_async().await;
}

#[tokio::test]
async fn connection_failures_count_against_the_budget() {
    let mut config = transport("http://127.0.0.1:1".to_string());
    config.retry.max_attempts = 2;
    let client = TissClient::new(config).unwrap();

    let err = client.submit_lot(&payload()).await.unwrap_err();
    assert!(matches!(err, InsuranceError::RetriesExhausted { attempts: 2, .. }));
}

#[tokio::test]
async fn request_is_latin1_with_auth_header() {
    let mut server = Server::new_async().await;
    let mut config = transport(server.url());
    config.endpoint.requires_auth_header = true;
    config.credentials = Some(Credentials::new("clinica", "s3cr3t"));

    let envelope = soap::envelope(&config.endpoint, config.credentials.as_ref(), &payload()).unwrap();
    let expected = integrity_engine::encode_latin1(&envelope).unwrap();
    assert!(expected.contains(&0xE3));
    assert!(envelope.contains("<tiss:senhaPrestador>s3cr3t</tiss:senhaPrestador>"));

    let mock = server
        .mock("POST", "/ws")
        .match_header("content-type", "text/xml; charset=ISO-8859-1")
        .match_header("soapaction", "\"tissLoteGuias_Operation\"")
        .match_body(expected)
        .with_status(200)
        .with_body(PROTOCOL_RECEIPT)
        .create_async()
        .await;

    let client = TissClient::new(config).unwrap();
    assert!(client.submit_lot(&payload()).await.unwrap().success);
    mock.assert_async().await;
}

#[tokio::test]
async fn soap12_eligibility_answer_is_decoded_as_latin1() {
    let mut server = Server::new_async().await;
    let mut config = transport(server.url());
    config.endpoint.soap_version = SoapVersion::V1_2;

    let mut body = br#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><respostaElegibilidade><respostaSolicitacao>S</respostaSolicitacao><nomePlano>Plano Sa"#.to_vec();
    body.push(0xFA);
    body.extend_from_slice(b"de</nomePlano></respostaElegibilidade></env:Body></env:Envelope>");

    let mock = server
        .mock("POST", "/ws")
        .match_header(
            "content-type",
            Matcher::Regex(r#"^application/soap\+xml; charset=ISO-8859-1; action="tissVerificaElegibilidade_Operation"$"#.to_string()),
        )
        .match_header("soapaction", Matcher::Missing)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = TissClient::new(config).unwrap();
    let outcome = client.check_eligibility(&payload()).await.unwrap();

    assert_eq!(outcome.eligible, Some(true));
    assert_eq!(outcome.plan_name.as_deref(), Some("Plano Sa\u{fa}de"));
    mock.assert_async().await;
}
