use crate::classifier::{ClassifiedGlosa, GlosaStatus};
use crate::table::SuggestedAction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Pending rejections sharing one suggested action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGroup {
    pub action: SuggestedAction,
    pub priority: u8,
    pub count: usize,
    pub total_value: Decimal,
    pub codes: BTreeSet<String>,
    pub guides: BTreeSet<String>,
    pub guidance: String,
}

/// Group pending records by action, most urgent action first, then by value at stake
pub fn prioritize_actions(records: &[ClassifiedGlosa]) -> Vec<ActionGroup> {
    let mut groups: HashMap<SuggestedAction, ActionGroup> = HashMap::new();

    for record in records.iter().filter(|r| r.status() == GlosaStatus::Pending) {
        let action = record.action();
        let group = groups.entry(action).or_insert_with(|| ActionGroup {
            action,
            priority: action.priority(),
            count: 0,
            total_value: Decimal::ZERO,
            codes: BTreeSet::new(),
            guides: BTreeSet::new(),
            guidance: String::new(),
        });
        group.count += 1;
        group.total_value += record.rejected_value();
        group.codes.insert(record.code().to_string());
        if let Some(guide) = &record.glosa().guide_number {
            group.guides.insert(guide.clone());
        }
    }

    let mut ordered: Vec<ActionGroup> = groups
        .into_values()
        .map(|mut group| {
            group.guidance = format!(
                "{}: {} rejection(s) worth {} across codes {}",
                group.action.instruction(),
                group.count,
                billing_service::format_money(group.total_value),
                group.codes.iter().cloned().collect::<Vec<_>>().join(", ")
            );
            group
        })
        .collect();
    ordered.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.total_value.cmp(&a.total_value))
    });
    ordered
}

/// Records split by whether their fix can be applied mechanically
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub automatable: Vec<ClassifiedGlosa>,
    pub manual: Vec<ClassifiedGlosa>,
}

pub fn partition_automatable(records: impl IntoIterator<Item = ClassifiedGlosa>) -> Partition {
    let (automatable, manual) = records.into_iter().partition(ClassifiedGlosa::automatable);
    Partition {
        automatable,
        manual,
    }
}
