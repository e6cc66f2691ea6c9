use crate::classifier::{ClassifiedGlosa, GlosaStatus};
use crate::table::GlosaCategory;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_TOP_CODES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub count: usize,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeTotals {
    pub code: String,
    pub description: String,
    pub count: usize,
    pub value: Decimal,
}

/// Aggregate view over a set of classified rejections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlosaStatistics {
    pub total_count: usize,
    pub total_value: Decimal,
    pub by_category: BTreeMap<GlosaCategory, CategoryTotals>,
    /// Codes by rejected value, largest first
    pub top_codes: Vec<CodeTotals>,
    /// Share of records taken to appeal, in percent
    pub appeal_rate: Decimal,
    /// Share of appealed records resolved in the provider's favour, in percent
    pub appeal_success_rate: Decimal,
}

fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Per-category totals, the `top_n` codes by value and appeal rates
pub fn compute_statistics(records: &[ClassifiedGlosa], top_n: usize) -> GlosaStatistics {
    let mut by_category: BTreeMap<GlosaCategory, CategoryTotals> = BTreeMap::new();
    let mut by_code: HashMap<&str, CodeTotals> = HashMap::new();
    let mut appealed = 0;
    let mut resolved = 0;

    for record in records {
        let category = by_category.entry(record.category()).or_default();
        category.count += 1;
        category.value += record.rejected_value();

        let code = by_code.entry(record.code()).or_insert_with(|| CodeTotals {
            code: record.code().to_string(),
            description: record.glosa().description.clone(),
            count: 0,
            value: Decimal::ZERO,
        });
        code.count += 1;
        code.value += record.rejected_value();
        if code.description.is_empty() {
            code.description.clone_from(&record.glosa().description);
        }

        if record.appealed() {
            appealed += 1;
            if record.status() == GlosaStatus::Resolved {
                resolved += 1;
            }
        }
    }

    let mut top_codes: Vec<CodeTotals> = by_code.into_values().collect();
    top_codes.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.code.cmp(&b.code)));
    top_codes.truncate(top_n);

    GlosaStatistics {
        total_count: records.len(),
        total_value: records.iter().map(ClassifiedGlosa::rejected_value).sum(),
        by_category,
        top_codes,
        appeal_rate: percent(appealed, records.len()),
        appeal_success_rate: percent(resolved, appealed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::GlosaTable;
    use billing_service::Glosa;

    fn appealed(code: &str, cents: i64, outcome: GlosaStatus) -> ClassifiedGlosa {
        let mut record = record(code, cents, GlosaStatus::AppealSent);
        record.transition(outcome).unwrap();
        record
    }

    fn record(code: &str, cents: i64, status: GlosaStatus) -> ClassifiedGlosa {
        let mut record = GlosaTable::default().classify_glosa(Glosa {
            code: code.to_string(),
            description: format!("desc {}", code),
            rejected_value: Decimal::new(cents, 2),
            guide_number: None,
            item_sequence: None,
            procedure_code: None,
        });
        if status == GlosaStatus::Resolved {
            record.transition(GlosaStatus::AppealSent).unwrap();
        }
        record.transition(status).unwrap();
        record
    }

    #[test]
    fn test_category_totals_and_top_codes() {
        let records = vec![
            record("2010", 5000, GlosaStatus::Pending),
            record("2010", 2500, GlosaStatus::Pending),
            record("6001", 10000, GlosaStatus::Pending),
            record("1001", 1000, GlosaStatus::Pending),
        ];
        let stats = compute_statistics(&records, 2);

        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.total_value, Decimal::new(18500, 2));
        let technical = &stats.by_category[&GlosaCategory::Technical];
        assert_eq!(technical.count, 2);
        assert_eq!(technical.value, Decimal::new(7500, 2));

        let codes: Vec<&str> = stats.top_codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["6001", "2010"]);
        assert_eq!(stats.top_codes[1].count, 2);
    }

    #[test]
    fn test_appeal_rates() {
        let records = vec![
            record("2010", 100, GlosaStatus::AppealSent),
            record("2010", 100, GlosaStatus::Resolved),
            record("3001", 100, GlosaStatus::Accepted),
            record("4001", 100, GlosaStatus::Pending),
        ];
        let stats = compute_statistics(&records, DEFAULT_TOP_CODES);
        assert_eq!(stats.appeal_rate, Decimal::new(5000, 2));
        assert_eq!(stats.appeal_success_rate, Decimal::new(5000, 2));
    }

    #[test]
    fn test_lost_appeals_count_against_success_rate() {
        let records = vec![
            appealed("2010", 100, GlosaStatus::Resolved),
            appealed("3001", 100, GlosaStatus::Accepted),
        ];
        let stats = compute_statistics(&records, DEFAULT_TOP_CODES);
        assert_eq!(stats.appeal_rate, Decimal::new(10000, 2));
        assert_eq!(stats.appeal_success_rate, Decimal::new(5000, 2));
    }

    #[test]
    fn test_empty_input() {
        let stats = compute_statistics(&[], DEFAULT_TOP_CODES);
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.appeal_rate, Decimal::ZERO);
        assert!(stats.top_codes.is_empty());
    }
}
