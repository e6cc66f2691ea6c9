#![allow(dead_code)]

use billing_service::*;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Provider identified by its 14-digit CNPJ only
pub fn provider() -> Provider {
    Provider {
        tax_id: "11222333000181".to_string(),
        payer_code: None,
        name: "Consult\u{f3}rio S\u{e3}o Jos\u{e9}".to_string(),
        cnes: None,
    }
}

pub fn config(version: ProtocolVersion) -> BuilderConfig {
    BuilderConfig {
        version,
        provider: provider(),
        payer_registry_id: "654321".to_string(),
    }
}

pub fn consultation(number: &str, value: Decimal) -> Guide {
    Guide::Consultation(ConsultationGuide {
        core: GuideCore {
            header: GuideHeader {
                registry_id: "654321".to_string(),
                provider_number: number.to_string(),
                payer_number: None,
                authorization_number: None,
                authorization_date: None,
            },
            beneficiary: Beneficiary {
                card_number: "9876543210".to_string(),
                name: "Jos\u{e9} Ara\u{fa}jo".to_string(),
                social_name: None,
                health_card: None,
                newborn: false,
            },
            professionals: vec![Professional {
                tax_id: None,
                name: "Ana Lima".to_string(),
                council: "06".to_string(),
                council_number: "99887".to_string(),
                state: "RJ".to_string(),
                occupation_code: "225125".to_string(),
                role: ProfessionalRole::Executing,
            }],
            procedures: vec![ProcedureLine {
                sequence: 1,
                execution_date: date(2024, 5, 2),
                start_time: NaiveTime::from_hms_opt(14, 0, 0),
                end_time: NaiveTime::from_hms_opt(14, 20, 0),
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
            }],
            totals: ValueTotals::procedures_only(value),
            notes: None,
        },
        consultation_type: "1".to_string(),
        accident_indication: "9".to_string(),
    })
}
