use crate::models::{GRAND_TOTAL, TOTAL_PARTS};
use crate::money::{format_money, parse_money};
use chrono::{NaiveDate, NaiveTime};
use error_common::codes::{rules, warnings};
use error_common::ValidationIssue;
use integrity_engine::tree::Element;
use integrity_engine::{verify, IntegrityError};
use rust_decimal::Decimal;

#[allow(clippy::unwrap_used)]
mod patterns {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        pub static ref REGISTRY_ID: Regex = Regex::new(r"^\d{6}$").unwrap();
        pub static ref CNPJ: Regex = Regex::new(r"^\d{14}$").unwrap();
        // letter, 2-3 digits, optional decimal part
        pub static ref DIAGNOSIS: Regex = Regex::new(r"^[A-Z]\d{2}\d?(\.\d{1,2})?$").unwrap();
        pub static ref DIAGNOSIS_LOOSE: Regex = Regex::new(r"^[A-Za-z]\d{2}").unwrap();
        pub static ref PROCEDURE_CODE: Regex = Regex::new(r"^\d{8,10}$").unwrap();
        pub static ref OCCUPATION_CODE: Regex = Regex::new(r"^\d{6}$").unwrap();
        pub static ref TIME: Regex = Regex::new(r"^\d{2}:\d{2}:\d{2}$").unwrap();
    }
}

use patterns::*;

pub(crate) const STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Declared text length limits per element, (min, max) in characters
pub(crate) const FIELD_LENGTHS: &[(&str, usize, usize)] = &[
    ("numeroCarteira", 1, 20),
    ("nomeBeneficiario", 1, 70),
    ("nomeSocialBeneficiario", 1, 70),
    ("numeroCNS", 15, 15),
    ("nomeProfissional", 1, 70),
    ("nomeContratado", 1, 70),
    ("numeroConselhoProfissional", 1, 15),
    ("codigoPrestadorNaOperadora", 1, 14),
    ("numeroGuiaPrestador", 1, 20),
    ("numeroGuiaOperadora", 1, 20),
    ("senha", 1, 20),
    ("numeroLote", 1, 20),
    ("numeroProtocolo", 1, 20),
    ("descricaoProcedimento", 1, 150),
    ("indicacaoClinica", 1, 500),
    ("justificativaItem", 1, 500),
    ("observacao", 1, 500),
];

/// Field-format and value checks over every element of the document.
pub(crate) fn check(doc: &str, root: &Element, today: NaiveDate) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_digest(doc, &mut issues);

    for element in std::iter::once(root).chain(root.descendants()) {
        if !element.is_leaf() {
            if element.local_name == "valorTotal" {
                check_totals(element, &mut issues);
            }
            continue;
        }
        check_field(&element.local_name, &element.text, today, &mut issues);
    }

    issues
}

/// Grand total of a `valorTotal` block against its sub-totals. Unparsable values are left to
/// the field checks.
fn check_totals(block: &Element, issues: &mut Vec<ValidationIssue>) {
    let Some(Ok(declared)) = block.child(GRAND_TOTAL).map(|e| parse_money(&e.text)) else {
        return;
    };
    let mut sum = Decimal::ZERO;
    for part in block.children.iter().filter(|e| TOTAL_PARTS.contains(&e.local_name.as_str())) {
        match parse_money(&part.text) {
            Ok(value) => sum += value,
            Err(_) => return,
        }
    }
    if sum != declared {
        issues.push(
            ValidationIssue::error(
                rules::INCONSISTENT_TOTAL,
                format!(
                    "{} does not match the sum of the sub-totals {}",
                    format_money(declared),
                    format_money(sum)
                ),
            )
            .with_field(GRAND_TOTAL),
        );
    }
}

fn check_digest(doc: &str, issues: &mut Vec<ValidationIssue>) {
    match verify(doc) {
        Ok(result) if result.matches => {}
        Ok(result) => issues.push(
            ValidationIssue::error(
                rules::DIGEST_MISMATCH,
                format!(
                    "embedded digest {} does not match computed {}",
                    result.embedded, result.computed
                ),
            )
            .with_field("hash"),
        ),
        // reported by the structural phase
        Err(IntegrityError::MissingDigest) => {}
        Err(err) => issues.push(
            ValidationIssue::error(
                rules::DIGEST_UNVERIFIABLE,
                format!("digest cannot be recomputed: {}", err),
            )
            .with_field("hash"),
        ),
    }
}

fn check_field(name: &str, value: &str, today: NaiveDate, issues: &mut Vec<ValidationIssue>) {
    let mut push = |issue: ValidationIssue| issues.push(issue.with_field(name));

    match name {
        "registroANS" if !REGISTRY_ID.is_match(value) => push(ValidationIssue::error(
            rules::INVALID_REGISTRY_ID,
            format!("'{}' must have 6 digits", value),
        )),
        "CNPJ" | "cnpjContratado" if !CNPJ.is_match(value) => push(ValidationIssue::error(
            rules::INVALID_TAX_ID,
            format!("'{}' must have 14 digits", value),
        )),
        "diagnosticoCID" | "CID" if !DIAGNOSIS.is_match(value) => {
            if DIAGNOSIS_LOOSE.is_match(value) {
                push(ValidationIssue::warning(
                    warnings::LOOSE_DIAGNOSIS,
                    format!("'{}' only loosely matches an ICD-10 code", value),
                ))
            } else {
                push(ValidationIssue::error(
                    rules::INVALID_DIAGNOSIS,
                    format!("'{}' is not an ICD-10 code", value),
                ))
            }
        }
        "codigoProcedimento" if !PROCEDURE_CODE.is_match(value) => push(ValidationIssue::error(
            rules::INVALID_PROCEDURE_CODE,
            format!("'{}' must have 8 to 10 digits", value),
        )),
        "CBOS" if !OCCUPATION_CODE.is_match(value) => push(ValidationIssue::error(
            rules::INVALID_OCCUPATION_CODE,
            format!("'{}' must have 6 digits", value),
        )),
        "UF" if !STATES.contains(&value) => push(ValidationIssue::error(
            rules::INVALID_STATE,
            format!("'{}' is not a state abbreviation", value),
        )),
        _ => {}
    }

    if name.starts_with("data") {
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) if date > today => push(ValidationIssue::warning(
                warnings::FUTURE_DATE,
                format!("{} is in the future", value),
            )),
            Ok(_) => {}
            Err(_) => push(ValidationIssue::error(
                rules::INVALID_DATE,
                format!("'{}' is not a YYYY-MM-DD date", value),
            )),
        }
    }

    if name.starts_with("hora")
        && (!TIME.is_match(value) || NaiveTime::parse_from_str(value, "%H:%M:%S").is_err())
    {
        push(ValidationIssue::error(
            rules::INVALID_TIME,
            format!("'{}' is not a HH:MM:SS time", value),
        ));
    }

    if let Some((_, min, max)) = FIELD_LENGTHS.iter().find(|(field, _, _)| *field == name) {
        let length = value.chars().count();
        if length < *min || length > *max {
            push(ValidationIssue::error(
                rules::INVALID_LENGTH,
                format!("length {} outside {}..={}", length, min, max),
            ));
        }
    }

    if name.starts_with("valor") {
        match parse_money(value) {
            Ok(amount) if amount < Decimal::ZERO => push(ValidationIssue::error(
                rules::NEGATIVE_VALUE,
                format!("{} is negative", value),
            )),
            Ok(_) => {}
            Err(_) => push(ValidationIssue::error(
                rules::INVALID_MONETARY_VALUE,
                format!("'{}' is not a monetary value", value),
            )),
        }
    }
}
