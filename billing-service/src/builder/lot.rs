use crate::error::{BillingError, BillingResult};
use crate::models::{Guide, GuideVariant, Lot, MAX_GUIDES_PER_LOT};
use std::collections::BTreeMap;

/// Highest sequence a four-digit lot identifier can carry
pub const MAX_LOT_SEQUENCE: usize = 9999;

/// Lot identifier for the `sequence`-th lot of a split, e.g. `LOTE-0003`
pub fn lot_id(prefix: &str, sequence: usize) -> BillingResult<String> {
    if !(1..=MAX_LOT_SEQUENCE).contains(&sequence) {
        return Err(BillingError::InvalidInput(format!(
            "lot sequence {} outside 1..={}",
            sequence, MAX_LOT_SEQUENCE
        )));
    }
    Ok(format!("{}-{:04}", prefix, sequence))
}

/// Partition `guides` into consecutive lots of at most [`MAX_GUIDES_PER_LOT`].
///
/// Lots are numbered from 1 and keep the original guide order, so concatenating their guides
/// gives back the input.
pub fn split_into_lots(guides: Vec<Guide>, prefix: &str) -> BillingResult<Vec<Lot>> {
    let mut lots = Vec::with_capacity(guides.len().div_ceil(MAX_GUIDES_PER_LOT));
    let mut remaining = guides.into_iter().peekable();
    let mut sequence = 0;

    while remaining.peek().is_some() {
        sequence += 1;
        let chunk: Vec<Guide> = remaining.by_ref().take(MAX_GUIDES_PER_LOT).collect();
        lots.push(Lot::new(lot_id(prefix, sequence)?, chunk)?);
    }

    Ok(lots)
}

/// Guides of a lot grouped by variant, in variant order, keeping relative order inside a group
pub(crate) fn group_by_variant(guides: &[Guide]) -> BTreeMap<GuideVariant, Vec<&Guide>> {
    let mut groups: BTreeMap<GuideVariant, Vec<&Guide>> = BTreeMap::new();
    for guide in guides {
        groups.entry(guide.variant()).or_default().push(guide);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{consultation_guide, dental_guide, sp_sadt_guide};

    fn numbered(n: usize) -> Vec<Guide> {
        (1..=n).map(|i| consultation_guide(&format!("G{}", i))).collect()
    }

    #[test]
    fn test_split_250_guides() {
        let lots = split_into_lots(numbered(250), "LOTE").unwrap();
        let sizes: Vec<usize> = lots.iter().map(Lot::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        let ids: Vec<&str> = lots.iter().map(Lot::id).collect();
        assert_eq!(ids, vec!["LOTE-0001", "LOTE-0002", "LOTE-0003"]);
        assert_eq!(lots[1].guides()[0].provider_number(), "G101");
    }

    #[test]
    fn test_split_exact_multiple_and_empty() {
        assert_eq!(split_into_lots(numbered(100), "L").unwrap().len(), 1);
        assert_eq!(split_into_lots(numbered(200), "L").unwrap().len(), 2);
        assert!(split_into_lots(Vec::new(), "L").unwrap().is_empty());
    }

    #[test]
    fn test_lot_id_stays_four_digits() {
        assert_eq!(lot_id("LOTE", 1).unwrap(), "LOTE-0001");
        assert_eq!(lot_id("LOTE", 9999).unwrap(), "LOTE-9999");
        assert!(matches!(lot_id("LOTE", 10_000), Err(BillingError::InvalidInput(_))));
        assert!(lot_id("LOTE", 0).is_err());
    }

    #[test]
    fn test_group_by_variant_keeps_relative_order() {
        let guides = vec![
            sp_sadt_guide("S1"),
            consultation_guide("C1"),
            dental_guide("D1"),
            consultation_guide("C2"),
        ];
        let groups = group_by_variant(&guides);
        let variants: Vec<GuideVariant> = groups.keys().copied().collect();
        assert_eq!(
            variants,
            vec![GuideVariant::Consultation, GuideVariant::SpSadt, GuideVariant::Dental]
        );
        let consultations: Vec<&str> = groups[&GuideVariant::Consultation]
            .iter()
            .map(|g| g.provider_number())
            .collect();
        assert_eq!(consultations, vec!["C1", "C2"]);
    }
}
