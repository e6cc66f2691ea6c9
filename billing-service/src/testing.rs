//! Guide fixtures shared by unit tests

use crate::models::*;
use crate::version::ProtocolVersion;
use crate::BuilderConfig;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn provider() -> Provider {
    Provider {
        tax_id: "12345678000190".to_string(),
        payer_code: Some("PREST001".to_string()),
        name: "Clinica Sao Lucas".to_string(),
        cnes: Some("1234567".to_string()),
    }
}

pub fn config(version: ProtocolVersion) -> BuilderConfig {
    BuilderConfig {
        version,
        provider: provider(),
        payer_registry_id: "123456".to_string(),
    }
}

pub fn beneficiary() -> Beneficiary {
    Beneficiary {
        card_number: "0012345678901".to_string(),
        name: "Maria da Silva".to_string(),
        social_name: Some("Mari Silva".to_string()),
        health_card: Some("898001234567890".to_string()),
        newborn: false,
    }
}

pub fn professional(role: ProfessionalRole) -> Professional {
    Professional {
        tax_id: Some("12345678909".to_string()),
        name: "Jo\u{e3}o Pereira".to_string(),
        council: "06".to_string(),
        council_number: "123456".to_string(),
        state: "SP".to_string(),
        occupation_code: "225125".to_string(),
        role,
    }
}

pub fn procedure_line(sequence: u32, value: Decimal) -> ProcedureLine {
    ProcedureLine {
        sequence,
        execution_date: date(2024, 3, 10),
        start_time: NaiveTime::from_hms_opt(9, 0, 0),
        end_time: NaiveTime::from_hms_opt(9, 30, 0),
        table_code: "22".to_string(),
        procedure_code: "10101012".to_string(),
        description: "Consulta em consult\u{f3}rio".to_string(),
        quantity: Decimal::ONE,
        route: None,
        technique: None,
        unit_value: value,
        total_value: value,
        tooth: None,
        tooth_faces: None,
    }
}

pub fn core(number: &str, value: Decimal) -> GuideCore {
    GuideCore {
        header: GuideHeader {
            registry_id: "123456".to_string(),
            provider_number: number.to_string(),
            payer_number: None,
            authorization_number: None,
            authorization_date: None,
        },
        beneficiary: beneficiary(),
        professionals: vec![professional(ProfessionalRole::Executing)],
        procedures: vec![procedure_line(1, value)],
        totals: ValueTotals::procedures_only(value),
        notes: None,
    }
}

pub fn consultation_guide(number: &str) -> Guide {
    Guide::Consultation(ConsultationGuide {
        core: core(number, Decimal::new(15000, 2)),
        consultation_type: "1".to_string(),
        accident_indication: "9".to_string(),
    })
}

pub fn sp_sadt_guide(number: &str) -> Guide {
    let mut core = core(number, Decimal::new(8990, 2));
    core.professionals
        .insert(0, professional(ProfessionalRole::Requesting));
    Guide::SpSadt(SpSadtGuide {
        core,
        main_guide_number: None,
        request_date: Some(date(2024, 3, 9)),
        character: "1".to_string(),
        clinical_indication: Some("Dor abdominal".to_string()),
        service_type: "05".to_string(),
        accident_indication: "9".to_string(),
        diagnosis: Some("K35.8".to_string()),
    })
}

pub fn hospitalization_guide(number: &str) -> Guide {
    let mut core = core(number, Decimal::new(120000, 2));
    core.totals = ValueTotals::from_parts(
        Some(Decimal::new(120000, 2)),
        Some(Decimal::new(45000, 2)),
        None,
        Some(Decimal::new(3210, 2)),
        Some(Decimal::new(1890, 2)),
        None,
        None,
    );
    Guide::Hospitalization(HospitalizationGuide {
        core,
        character: "2".to_string(),
        billing_type: "4".to_string(),
        billing_start: date(2024, 3, 1),
        billing_end: date(2024, 3, 4),
        admission_type: "1".to_string(),
        admission_regime: "1".to_string(),
        diagnosis: Some("K35".to_string()),
        accident_indication: "9".to_string(),
        discharge_reason: "11".to_string(),
    })
}

pub fn fee_guide(number: &str) -> Guide {
    Guide::FeeForService(FeeForServiceGuide {
        core: core(number, Decimal::new(70000, 2)),
        hospitalization_guide_number: "INT-778".to_string(),
        facility: Provider {
            tax_id: "98765432000110".to_string(),
            payer_code: None,
            name: "Hospital Central".to_string(),
            cnes: Some("7654321".to_string()),
        },
        billing_start: date(2024, 3, 1),
        billing_end: date(2024, 3, 4),
    })
}

pub fn dental_guide(number: &str) -> Guide {
    let mut core = core(number, Decimal::new(25000, 2));
    if let Some(line) = core.procedures.first_mut() {
        line.procedure_code = "81000065".to_string();
        line.description = "Restaura\u{e7}\u{e3}o".to_string();
        line.tooth = Some("11".to_string());
        line.tooth_faces = Some("OV".to_string());
    }
    Guide::Dental(DentalGuide {
        core,
        service_type: "1".to_string(),
        treatment_start: Some(date(2024, 3, 10)),
    })
}
