//! Payer return documents
//!
//! A return (demonstrativo) answers a submitted lot: protocol identification, the value the
//! provider informed, the value the payer processed and every rejection applied along the way.

use crate::classifier::ClassifiedGlosa;
use crate::error::{GlosaError, GlosaResult};
use crate::table::GlosaTable;
use billing_service::{parse_money, BillingError};
use billing_service::wire::read_glosas;
use chrono::NaiveDate;
use integrity_engine::tree::{self, Element};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Overall verdict on a lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnOutcome {
    Accepted,
    Partial,
    Rejected,
}

/// Outcome from informed and rejected totals.
///
/// Nothing informed but something rejected counts as rejected.
pub fn derive_outcome(informed: Decimal, rejected: Decimal) -> ReturnOutcome {
    if rejected <= Decimal::ZERO {
        ReturnOutcome::Accepted
    } else if informed <= Decimal::ZERO || rejected >= informed {
        ReturnOutcome::Rejected
    } else {
        ReturnOutcome::Partial
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnStatement {
    pub protocol_number: String,
    pub protocol_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    pub informed_total: Decimal,
    pub processed_total: Option<Decimal>,
    pub rejected_total: Decimal,
    pub glosas: Vec<ClassifiedGlosa>,
    pub outcome: ReturnOutcome,
}

fn parse_field(field: &'static str, text: &str) -> GlosaResult<Decimal> {
    parse_money(text).map_err(|_| GlosaError::InvalidValue {
        field,
        value: text.to_string(),
    })
}

/// Sum of every non-empty `name` element, `None` when there is none
fn sum_of(root: &Element, field: &'static str, name: &str) -> GlosaResult<Option<Decimal>> {
    let mut total = None;
    for element in root.find_all(name) {
        let text = element.text.trim();
        if text.is_empty() {
            continue;
        }
        *total.get_or_insert(Decimal::ZERO) += parse_field(field, text)?;
    }
    Ok(total)
}

/// A protocol-level total, else the sum of the per-guide totals, else the bare field
fn total(root: &Element, field: &'static str) -> GlosaResult<Option<Decimal>> {
    if let Some(text) = root.text_of(&format!("{}Protocolo", field)) {
        return parse_field(field, text).map(Some);
    }
    if let Some(sum) = sum_of(root, field, &format!("{}Guia", field))? {
        return Ok(Some(sum));
    }
    root.text_of(field).map(|text| parse_field(field, text)).transpose()
}

/// Parse a return document and classify every rejection in it
pub fn parse_return_document(doc: &str, table: &GlosaTable) -> GlosaResult<ReturnStatement> {
    let parsed = tree::parse(doc).map_err(|e| GlosaError::Structure(e.to_string()))?;
    let root = &parsed.root;

    let protocol_number = root
        .text_of("numeroProtocolo")
        .ok_or(GlosaError::MissingField("numeroProtocolo"))?
        .to_string();

    let protocol_date = root.text_of("dataProtocolo").and_then(|text| {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| warn!(protocol = %protocol_number, value = text, "unparsable protocol date"))
            .ok()
    });

    let informed_total = total(root, "valorInformado")?.unwrap_or(Decimal::ZERO);
    let processed_total = total(root, "valorProcessado")?;

    let glosas = read_glosas(root).map_err(|e| match e {
        BillingError::InvalidMoney(value) => GlosaError::InvalidValue {
            field: "valorGlosa",
            value,
        },
        other => GlosaError::Structure(other.to_string()),
    })?;
    let glosas = table.classify_all(glosas);
    let declared_rejected = match root.text_of("valorGlosaProtocolo") {
        Some(text) => Some(parse_field("valorGlosa", text)?),
        None => root
            .text_of("valorTotalGlosa")
            .map(|text| parse_field("valorGlosa", text))
            .transpose()?,
    };
    let rejected_total = declared_rejected
        .unwrap_or_else(|| glosas.iter().map(ClassifiedGlosa::rejected_value).sum());

    let outcome = derive_outcome(informed_total, rejected_total);
    info!(
        protocol = %protocol_number,
        glosas = glosas.len(),
        informed = %informed_total,
        rejected = %rejected_total,
        outcome = ?outcome,
        "return document parsed"
    );

    Ok(ReturnStatement {
        protocol_number,
        protocol_date,
        lot_number: root.text_of("numeroLote").map(str::to_string),
        informed_total,
        processed_total,
        rejected_total,
        glosas,
        outcome,
    })
}
