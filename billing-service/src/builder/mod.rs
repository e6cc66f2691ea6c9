//! Message Builder
//!
//! Composes guides, lots and ancillary transactions into signed TISS documents. Every document
//! shares the same envelope: a `cabecalho` identifying the transaction, a
//! `prestadorParaOperadora` body and the `epilogo` digest appended by the integrity engine.

mod guides;
mod lot;
mod transactions;
pub(crate) mod writer;

pub use lot::{lot_id, split_into_lots, MAX_LOT_SEQUENCE};

use crate::error::{BillingError, BillingResult};
use crate::models::*;
use crate::version::ProtocolVersion;
use crate::wire::{ROOT_ELEMENT, VERSION_ELEMENT};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use writer::TissWriter;

/// Parameters one builder instance is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub version: ProtocolVersion,
    pub provider: Provider,
    /// Payer's `registroANS`, written as the message destination
    pub payer_registry_id: String,
}

impl BuilderConfig {
    /// Registry cache key: one instance per version and provider
    pub fn cache_key(&self) -> (ProtocolVersion, String) {
        (self.version, self.provider.registration_code().to_string())
    }
}

/// Version-specific document builder
pub trait MessageBuilder: Send + Sync {
    fn version(&self) -> ProtocolVersion;

    /// Signed `ENVIO_LOTE_GUIAS` document
    fn build_lot(&self, lot: &Lot) -> BillingResult<String>;

    fn build_procedure_request(&self, request: &ProcedureRequest) -> BillingResult<String>;

    fn build_eligibility_check(&self, query: &EligibilityQuery) -> BillingResult<String>;

    fn build_protocol_status_query(&self, query: &ProtocolStatusQuery) -> BillingResult<String>;

    fn build_glosa_appeal(&self, appeal: &GlosaAppeal) -> BillingResult<String>;
}

/// Builder for one protocol version and provider.
///
/// The transaction sequence counter is shared by every document this instance builds and is
/// safe to use from several threads.
#[derive(Debug)]
pub struct TissMessageBuilder {
    config: BuilderConfig,
    sequence: AtomicU64,
}

impl TissMessageBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn envelope<F>(&self, kind: TransactionKind, body: F) -> BillingResult<String>
    where
        F: FnOnce(&mut TissWriter) -> BillingResult<()>,
    {
        let sequence = self.next_sequence();
        let now = Local::now().naive_local();
        let provider = &self.config.provider;

        let mut w = TissWriter::new()?;
        w.root(ROOT_ELEMENT, |w| {
            w.element("cabecalho", |w| {
                w.element("identificacaoTransacao", |w| {
                    w.leaf("tipoTransacao", kind.wire_name())?;
                    w.number("sequencialTransacao", sequence)?;
                    w.date("dataRegistroTransacao", now.date())?;
                    w.opt_time("horaRegistroTransacao", Some(now.time()))
                })?;
                w.element("origem", |w| {
                    w.element("identificacaoPrestador", |w| match provider.payer_code.as_deref() {
                        Some(code) => w.leaf("codigoPrestadorNaOperadora", code),
                        None => w.leaf("CNPJ", &provider.tax_id),
                    })
                })?;
                w.element("destino", |w| {
                    w.leaf("registroANS", &self.config.payer_registry_id)
                })?;
                w.leaf(VERSION_ELEMENT, self.config.version.label())
            })?;
            w.element("prestadorParaOperadora", body)
        })?;

        let signed = integrity_engine::embed(&w.finish()?)?;
        debug!(
            transaction = kind.wire_name(),
            sequence,
            version = %self.config.version,
            "document built"
        );
        Ok(signed)
    }
}

impl MessageBuilder for TissMessageBuilder {
    fn version(&self) -> ProtocolVersion {
        self.config.version
    }

    fn build_lot(&self, lot: &Lot) -> BillingResult<String> {
        if lot.is_empty() {
            return Err(BillingError::InvalidInput(format!(
                "lot {} has no guides",
                lot.id()
            )));
        }

        let features = self.config.version.features();
        let provider = &self.config.provider;
        let doc = self.envelope(TransactionKind::LotSubmission, |w| {
            w.element("loteGuias", |w| {
                w.leaf("numeroLote", lot.id())?;
                for group in lot::group_by_variant(lot.guides()).into_values() {
                    w.element("guiasTISS", |w| {
                        for guide in group {
                            guides::write_guide(w, guide, provider, features)?;
                        }
                        Ok(())
                    })?;
                }
                Ok(())
            })
        })?;

        info!(
            lot = lot.id(),
            guides = lot.len(),
            total = %lot.total_value(),
            version = %self.config.version,
            "lot built"
        );
        Ok(doc)
    }

    fn build_procedure_request(&self, request: &ProcedureRequest) -> BillingResult<String> {
        let features = self.config.version.features();
        self.envelope(TransactionKind::ProcedureRequest, |w| {
            transactions::procedure_request(w, request, &self.config.provider, features)
        })
    }

    fn build_eligibility_check(&self, query: &EligibilityQuery) -> BillingResult<String> {
        let features = self.config.version.features();
        self.envelope(TransactionKind::EligibilityCheck, |w| {
            transactions::eligibility_check(w, query, &self.config.provider, features)
        })
    }

    fn build_protocol_status_query(&self, query: &ProtocolStatusQuery) -> BillingResult<String> {
        self.envelope(TransactionKind::ProtocolStatus, |w| {
            transactions::protocol_status(w, query, &self.config.provider)
        })
    }

    fn build_glosa_appeal(&self, appeal: &GlosaAppeal) -> BillingResult<String> {
        if appeal.items.is_empty() {
            return Err(BillingError::InvalidInput(format!(
                "appeal {} has no items",
                appeal.appeal_number
            )));
        }
        self.envelope(TransactionKind::GlosaAppeal, |w| {
            transactions::glosa_appeal(w, appeal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use integrity_engine::{tree, verify};
    use rust_decimal::Decimal;

    fn builder(version: ProtocolVersion) -> TissMessageBuilder {
        TissMessageBuilder::new(config(version))
    }

    #[test]
    fn test_lot_document_layout() {
        let lot = Lot::new(
            "LOTE-0001",
            vec![consultation_guide("C1"), sp_sadt_guide("S1"), consultation_guide("C2")],
        )
        .unwrap();
        let doc = builder(ProtocolVersion::V4_01_00).build_lot(&lot).unwrap();
        let parsed = tree::parse(&doc).unwrap();
        let root = &parsed.root;

        assert_eq!(root.name, "ans:mensagemTISS");
        assert_eq!(root.text_of("tipoTransacao"), Some("ENVIO_LOTE_GUIAS"));
        assert_eq!(root.text_of("Padrao"), Some("4.01.00"));
        assert_eq!(root.text_of("codigoPrestadorNaOperadora"), Some("PREST001"));
        assert_eq!(root.text_of("numeroLote"), Some("LOTE-0001"));

        let wrappers = root.find_all("guiasTISS");
        assert_eq!(wrappers.len(), 2);
        assert_eq!(wrappers[0].children_named("guiaConsulta").count(), 2);
        assert_eq!(wrappers[1].children_named("guiaSP-SADT").count(), 1);

        assert!(verify(&doc).unwrap().matches);
    }

    #[test]
    fn test_money_and_optional_fields() {
        let lot = Lot::new("LOTE-0001", vec![consultation_guide("C1")]).unwrap();
        let doc = builder(ProtocolVersion::V4_01_00).build_lot(&lot).unwrap();

        assert!(doc.contains("<ans:valorUnitario>150,00</ans:valorUnitario>"));
        assert!(doc.contains("<ans:valorTotalGeral>150,00</ans:valorTotalGeral>"));
        // no daily rates on a consultation
        assert!(!doc.contains("valorDiarias"));
        assert!(!doc.contains("numeroGuiaOperadora"));
        assert!(!doc.contains("observacao"));
    }

    #[test]
    fn test_inconsistent_totals_are_refused() {
        let mut guide = consultation_guide("C1");
        if let Guide::Consultation(g) = &mut guide {
            g.core.totals.total = Decimal::new(99900, 2);
        }
        let lot = Lot::new("LOTE-0001", vec![consultation_guide("C2"), guide]).unwrap();
        let err = builder(ProtocolVersion::V4_01_00).build_lot(&lot).unwrap_err();

        assert!(matches!(err, BillingError::InvalidInput(ref m) if m.starts_with("guide C1") && m.contains("150")));
    }

    #[test]
    fn test_version_features_shape_output() {
        let lot = Lot::new("LOTE-0001", vec![consultation_guide("C1")]).unwrap();

        let current = builder(ProtocolVersion::V4_01_00).build_lot(&lot).unwrap();
        assert!(current.contains("<ans:nomeSocialBeneficiario>Mari Silva</ans:nomeSocialBeneficiario>"));
        assert!(current.contains("<ans:horaInicial>09:00:00</ans:horaInicial>"));

        let legacy = builder(ProtocolVersion::V3_05_00).build_lot(&lot).unwrap();
        assert!(!legacy.contains("nomeSocialBeneficiario"));
        assert!(!legacy.contains("horaInicial"));
        assert!(legacy.contains("<ans:Padrao>3.05.00</ans:Padrao>"));
    }

    #[test]
    fn test_every_variant_builds_and_verifies() {
        let lot = Lot::new(
            "LOTE-0002",
            vec![
                consultation_guide("C1"),
                sp_sadt_guide("S1"),
                hospitalization_guide("H1"),
                fee_guide("F1"),
                dental_guide("D1"),
            ],
        )
        .unwrap();
        let doc = builder(ProtocolVersion::V4_00_01).build_lot(&lot).unwrap();
        let parsed = tree::parse(&doc).unwrap();

        for element in crate::wire::guide_elements() {
            assert_eq!(parsed.root.find_all(element).len(), 1, "{}", element);
        }
        assert_eq!(parsed.root.text_of("valorDiarias"), Some("450,00"));
        assert_eq!(parsed.root.text_of("denteFace"), Some("OV"));
        assert_eq!(parsed.root.text_of("guiaSolicInternacao"), Some("INT-778"));
        assert!(verify(&doc).unwrap().matches);
    }

    #[test]
    fn test_sequence_increases_per_document() {
        let b = builder(ProtocolVersion::V4_01_00);
        let query = ProtocolStatusQuery {
            protocol_number: "PROT-1".to_string(),
        };
        let first = b.build_protocol_status_query(&query).unwrap();
        let second = b.build_protocol_status_query(&query).unwrap();

        let seq = |doc: &str| {
            tree::parse(doc)
                .unwrap()
                .root
                .text_of("sequencialTransacao")
                .map(str::to_string)
        };
        assert_eq!(seq(&first).as_deref(), Some("1"));
        assert_eq!(seq(&second).as_deref(), Some("2"));
    }

    #[test]
    fn test_ancillary_transactions() {
        let b = builder(ProtocolVersion::V4_01_00);

        let eligibility = b
            .build_eligibility_check(&EligibilityQuery {
                beneficiary: beneficiary(),
                card_validity: Some(date(2030, 12, 31)),
            })
            .unwrap();
        let parsed = tree::parse(&eligibility).unwrap();
        assert_eq!(parsed.root.text_of("tipoTransacao"), Some("VERIFICA_ELEGIBILIDADE"));
        assert_eq!(parsed.root.text_of("numeroCarteira"), Some("0012345678901"));
        assert!(verify(&eligibility).unwrap().matches);

        let request = b
            .build_procedure_request(&ProcedureRequest {
                header: GuideHeader {
                    registry_id: "123456".to_string(),
                    provider_number: "SOL-1".to_string(),
                    payer_number: None,
                    authorization_number: None,
                    authorization_date: None,
                },
                beneficiary: beneficiary(),
                requester: professional(ProfessionalRole::Requesting),
                character: "1".to_string(),
                request_date: date(2024, 3, 9),
                clinical_indication: Some("Investigacao".to_string()),
                diagnosis: None,
                procedures: vec![RequestedProcedure {
                    table_code: "22".to_string(),
                    procedure_code: "40301630".to_string(),
                    description: "Hemograma".to_string(),
                    quantity: Decimal::ONE,
                }],
            })
            .unwrap();
        let parsed = tree::parse(&request).unwrap();
        assert_eq!(parsed.root.text_of("tipoTransacao"), Some("SOLICITACAO_PROCEDIMENTOS"));
        assert!(parsed.root.find("profissionalSolicitante").is_some());
        assert!(verify(&request).unwrap().matches);

        let appeal = b
            .build_glosa_appeal(&GlosaAppeal {
                registry_id: "123456".to_string(),
                appeal_number: "REC-1".to_string(),
                lot_number: "LOTE-0001".to_string(),
                protocol_number: "PROT-1".to_string(),
                guide_number: "C1".to_string(),
                payer_guide_number: None,
                appeal_date: date(2024, 4, 1),
                items: vec![
                    AppealItem {
                        item_sequence: Some(1),
                        glosa_code: "2010".to_string(),
                        appealed_value: Decimal::new(4000, 2),
                        justification: "Codigo corrigido".to_string(),
                    },
                    AppealItem {
                        item_sequence: None,
                        glosa_code: "1702".to_string(),
                        appealed_value: Decimal::new(1050, 2),
                        justification: "Carteira valida".to_string(),
                    },
                ],
            })
            .unwrap();
        let parsed = tree::parse(&appeal).unwrap();
        assert_eq!(parsed.root.text_of("tipoTransacao"), Some("RECURSO_GLOSA"));
        assert_eq!(parsed.root.text_of("valorTotalRecursado"), Some("50,50"));
        assert_eq!(parsed.root.find_all("itemRecurso").len(), 2);
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        let b = builder(ProtocolVersion::V4_01_00);
        let empty = Lot::new("LOTE-0001", Vec::new()).unwrap();
        assert!(matches!(b.build_lot(&empty), Err(BillingError::InvalidInput(_))));
    }

    #[test]
    fn test_provider_without_payer_code_is_identified_by_cnpj() {
        let mut cfg = config(ProtocolVersion::V4_01_00);
        cfg.provider.payer_code = None;
        let b = TissMessageBuilder::new(cfg);
        let lot = Lot::new("LOTE-0001", vec![consultation_guide("C1")]).unwrap();
        let doc = b.build_lot(&lot).unwrap();
        let parsed = tree::parse(&doc).unwrap();
        let origin = parsed.root.find("origem").unwrap();
        assert_eq!(origin.text_of("CNPJ"), Some("12345678000190"));
        assert_eq!(parsed.root.text_of("cnpjContratado"), Some("12345678000190"));
    }
}
