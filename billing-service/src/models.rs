use crate::error::{BillingError, BillingResult};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hard cap on guides per lot
pub const MAX_GUIDES_PER_LOT: usize = 100;

/// Sub-total elements of a `valorTotal` block, in wire order
pub const TOTAL_PARTS: [&str; 7] = [
    "valorProcedimentos",
    "valorDiarias",
    "valorTaxasAlugueis",
    "valorMateriais",
    "valorMedicamentos",
    "valorOPME",
    "valorGasesMedicinais",
];

/// Grand total element of a `valorTotal` block
pub const GRAND_TOTAL: &str = "valorTotalGeral";

/// Care provider issuing the documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// CNPJ, 14 digits
    pub tax_id: String,
    /// Code assigned to the provider by the payer
    #[serde(default)]
    pub payer_code: Option<String>,
    pub name: String,
    /// National registry of health establishments
    #[serde(default)]
    pub cnes: Option<String>,
}

impl Provider {
    /// Identifier used towards the payer: the payer-assigned code when known, else the CNPJ
    pub fn registration_code(&self) -> &str {
        self.payer_code.as_deref().unwrap_or(&self.tax_id)
    }
}

/// Insured person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub card_number: String,
    pub name: String,
    #[serde(default)]
    pub social_name: Option<String>,
    /// CNS, 15 digits
    #[serde(default)]
    pub health_card: Option<String>,
    #[serde(default)]
    pub newborn: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalRole {
    Requesting,
    Executing,
}

/// Clinician taking part in a guide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professional {
    /// CPF, 11 digits
    #[serde(default)]
    pub tax_id: Option<String>,
    pub name: String,
    /// Council code from the terminology table (e.g. `06` for CRM)
    pub council: String,
    pub council_number: String,
    /// Two-letter state abbreviation
    pub state: String,
    /// CBO-S occupation code
    pub occupation_code: String,
    pub role: ProfessionalRole,
}

/// One billed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureLine {
    pub sequence: u32,
    pub execution_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Terminology table the code belongs to (e.g. `22` for TUSS procedures)
    pub table_code: String,
    pub procedure_code: String,
    pub description: String,
    pub quantity: Decimal,
    /// Access route (`viaAcesso`)
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    pub unit_value: Decimal,
    pub total_value: Decimal,
    /// Dental only: tooth or region
    #[serde(default)]
    pub tooth: Option<String>,
    /// Dental only: tooth faces, e.g. `OVL`
    #[serde(default)]
    pub tooth_faces: Option<String>,
}

/// Guide value summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTotals {
    #[serde(default)]
    pub procedures: Option<Decimal>,
    #[serde(default)]
    pub daily_rates: Option<Decimal>,
    #[serde(default)]
    pub fees: Option<Decimal>,
    #[serde(default)]
    pub materials: Option<Decimal>,
    #[serde(default)]
    pub medications: Option<Decimal>,
    #[serde(default)]
    pub devices: Option<Decimal>,
    #[serde(default)]
    pub gases: Option<Decimal>,
    pub total: Decimal,
}

impl ValueTotals {
    /// Build totals whose grand total is the sum of the populated parts.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        procedures: Option<Decimal>,
        daily_rates: Option<Decimal>,
        fees: Option<Decimal>,
        materials: Option<Decimal>,
        medications: Option<Decimal>,
        devices: Option<Decimal>,
        gases: Option<Decimal>,
    ) -> Self {
        let mut totals = Self {
            procedures,
            daily_rates,
            fees,
            materials,
            medications,
            devices,
            gases,
            total: Decimal::ZERO,
        };
        totals.total = totals.sum_of_parts();
        totals
    }

    /// Totals for a guide that only bills procedures
    pub fn procedures_only(value: Decimal) -> Self {
        Self::from_parts(Some(value), None, None, None, None, None, None)
    }

    pub fn sum_of_parts(&self) -> Decimal {
        self.parts().iter().filter_map(|(_, v)| *v).sum()
    }

    /// True when the grand total equals the sum of the populated sub-totals
    pub fn is_consistent(&self) -> bool {
        self.total == self.sum_of_parts()
    }

    /// Sub-totals paired with their wire element names
    pub fn parts(&self) -> [(&'static str, Option<Decimal>); 7] {
        let [procedures, daily_rates, fees, materials, medications, devices, gases] = TOTAL_PARTS;
        [
            (procedures, self.procedures),
            (daily_rates, self.daily_rates),
            (fees, self.fees),
            (materials, self.materials),
            (medications, self.medications),
            (devices, self.devices),
            (gases, self.gases),
        ]
    }
}

/// Identification shared by every guide variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideHeader {
    /// Payer registration with the regulator (`registroANS`), 6 digits
    pub registry_id: String,
    /// Number assigned by the provider
    pub provider_number: String,
    #[serde(default)]
    pub payer_number: Option<String>,
    #[serde(default)]
    pub authorization_number: Option<String>,
    #[serde(default)]
    pub authorization_date: Option<NaiveDate>,
}

/// Blocks every guide variant carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideCore {
    pub header: GuideHeader,
    pub beneficiary: Beneficiary,
    pub professionals: Vec<Professional>,
    pub procedures: Vec<ProcedureLine>,
    pub totals: ValueTotals,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationGuide {
    pub core: GuideCore,
    /// `tipoConsulta`: 1 first visit, 2 follow-up, 3 prenatal, 4 referral
    pub consultation_type: String,
    /// `indicacaoAcidente`: 0 work, 1 traffic, 2 other, 9 none
    #[serde(default = "no_accident")]
    pub accident_indication: String,
}

/// Exams and ambulatory therapies (SP/SADT)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpSadtGuide {
    pub core: GuideCore,
    #[serde(default)]
    pub main_guide_number: Option<String>,
    #[serde(default)]
    pub request_date: Option<NaiveDate>,
    /// `caraterAtendimento`: 1 elective, 2 urgency
    pub character: String,
    #[serde(default)]
    pub clinical_indication: Option<String>,
    /// `tipoAtendimento` terminology code
    pub service_type: String,
    #[serde(default = "no_accident")]
    pub accident_indication: String,
    /// ICD-10 code
    #[serde(default)]
    pub diagnosis: Option<String>,
}

/// Hospital stay billing summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalizationGuide {
    pub core: GuideCore,
    pub character: String,
    /// `tipoFaturamento`: 1 partial, 4 total, ...
    pub billing_type: String,
    pub billing_start: NaiveDate,
    pub billing_end: NaiveDate,
    pub admission_type: String,
    pub admission_regime: String,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default = "no_accident")]
    pub accident_indication: String,
    /// `motivoEncerramentoInternacao`
    pub discharge_reason: String,
}

/// Professional fees billed separately from a hospital stay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeForServiceGuide {
    pub core: GuideCore,
    /// Number of the hospitalization request the fees refer to
    pub hospitalization_guide_number: String,
    /// Facility where the service was performed
    pub facility: Provider,
    pub billing_start: NaiveDate,
    pub billing_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DentalGuide {
    pub core: GuideCore,
    /// `tipoAtendimento` for dental care
    pub service_type: String,
    #[serde(default)]
    pub treatment_start: Option<NaiveDate>,
}

fn no_accident() -> String {
    "9".to_string()
}

/// A single billable claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Guide {
    Consultation(ConsultationGuide),
    SpSadt(SpSadtGuide),
    Hospitalization(HospitalizationGuide),
    FeeForService(FeeForServiceGuide),
    Dental(DentalGuide),
}

/// Guide variant without its data, ordered the way lots group them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideVariant {
    Consultation,
    SpSadt,
    Hospitalization,
    FeeForService,
    Dental,
}

impl GuideVariant {
    pub const ALL: [GuideVariant; 5] = [
        GuideVariant::Consultation,
        GuideVariant::SpSadt,
        GuideVariant::Hospitalization,
        GuideVariant::FeeForService,
        GuideVariant::Dental,
    ];

    /// Wire element of one guide of this variant
    pub fn element(&self) -> &'static str {
        match self {
            GuideVariant::Consultation => "guiaConsulta",
            GuideVariant::SpSadt => "guiaSP-SADT",
            GuideVariant::Hospitalization => "guiaResumoInternacao",
            GuideVariant::FeeForService => "guiaHonorarios",
            GuideVariant::Dental => "guiaOdonto",
        }
    }
}

impl Guide {
    pub fn core(&self) -> &GuideCore {
        match self {
            Guide::Consultation(g) => &g.core,
            Guide::SpSadt(g) => &g.core,
            Guide::Hospitalization(g) => &g.core,
            Guide::FeeForService(g) => &g.core,
            Guide::Dental(g) => &g.core,
        }
    }

    pub fn variant(&self) -> GuideVariant {
        match self {
            Guide::Consultation(_) => GuideVariant::Consultation,
            Guide::SpSadt(_) => GuideVariant::SpSadt,
            Guide::Hospitalization(_) => GuideVariant::Hospitalization,
            Guide::FeeForService(_) => GuideVariant::FeeForService,
            Guide::Dental(_) => GuideVariant::Dental,
        }
    }

    pub fn provider_number(&self) -> &str {
        &self.core().header.provider_number
    }
}

/// Ordered batch of guides submitted together, never more than [`MAX_GUIDES_PER_LOT`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    id: String,
    guides: Vec<Guide>,
}

impl Lot {
    pub fn new(id: impl Into<String>, guides: Vec<Guide>) -> BillingResult<Self> {
        if guides.len() > MAX_GUIDES_PER_LOT {
            return Err(BillingError::LotSizeExceeded {
                count: guides.len(),
                max: MAX_GUIDES_PER_LOT,
            });
        }
        Ok(Self {
            id: id.into(),
            guides,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }

    pub fn into_guides(self) -> Vec<Guide> {
        self.guides
    }

    /// Sum of the grand totals of every guide
    pub fn total_value(&self) -> Decimal {
        self.guides.iter().map(|g| g.core().totals.total).sum()
    }
}

/// Payer rejection of part or all of a billed value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glosa {
    pub code: String,
    pub description: String,
    pub rejected_value: Decimal,
    #[serde(default)]
    pub guide_number: Option<String>,
    #[serde(default)]
    pub item_sequence: Option<u32>,
    #[serde(default)]
    pub procedure_code: Option<String>,
}

/// Transaction types carried in `tipoTransacao`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    LotSubmission,
    ProcedureRequest,
    EligibilityCheck,
    ProtocolStatus,
    GlosaAppeal,
}

impl TransactionKind {
    pub fn wire_name(&self) -> &'static str {
        match self {
            TransactionKind::LotSubmission => "ENVIO_LOTE_GUIAS",
            TransactionKind::ProcedureRequest => "SOLICITACAO_PROCEDIMENTOS",
            TransactionKind::EligibilityCheck => "VERIFICA_ELEGIBILIDADE",
            TransactionKind::ProtocolStatus => "SOLICITA_STATUS_PROTOCOLO",
            TransactionKind::GlosaAppeal => "RECURSO_GLOSA",
        }
    }

    /// SOAP operation name exposed by payer web services
    pub fn operation(&self) -> &'static str {
        match self {
            TransactionKind::LotSubmission => "tissLoteGuias_Operation",
            TransactionKind::ProcedureRequest => "tissSolicitacaoProcedimento_Operation",
            TransactionKind::EligibilityCheck => "tissVerificaElegibilidade_Operation",
            TransactionKind::ProtocolStatus => "tissSolicitacaoStatusProtocolo_Operation",
            TransactionKind::GlosaAppeal => "tissRecursoGlosa_Operation",
        }
    }
}

/// Requested procedure in an authorization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedProcedure {
    pub table_code: String,
    pub procedure_code: String,
    pub description: String,
    pub quantity: Decimal,
}

/// Prior authorization request for exams or therapies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRequest {
    pub header: GuideHeader,
    pub beneficiary: Beneficiary,
    pub requester: Professional,
    pub character: String,
    pub request_date: NaiveDate,
    #[serde(default)]
    pub clinical_indication: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    pub procedures: Vec<RequestedProcedure>,
}

/// Beneficiary eligibility check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityQuery {
    pub beneficiary: Beneficiary,
    #[serde(default)]
    pub card_validity: Option<NaiveDate>,
}

/// Status query for a previously received lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStatusQuery {
    pub protocol_number: String,
}

/// One contested glosa inside an appeal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealItem {
    #[serde(default)]
    pub item_sequence: Option<u32>,
    pub glosa_code: String,
    pub appealed_value: Decimal,
    pub justification: String,
}

/// Appeal against glosas applied to one guide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlosaAppeal {
    pub registry_id: String,
    pub appeal_number: String,
    pub lot_number: String,
    pub protocol_number: String,
    pub guide_number: String,
    #[serde(default)]
    pub payer_guide_number: Option<String>,
    pub appeal_date: NaiveDate,
    pub items: Vec<AppealItem>,
}

impl GlosaAppeal {
    pub fn total_appealed(&self) -> Decimal {
        self.items.iter().map(|i| i.appealed_value).sum()
    }
}
