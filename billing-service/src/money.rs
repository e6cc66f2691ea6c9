//! Monetary literals as they appear on the wire: comma decimal separator, two places.

use crate::error::{BillingError, BillingResult};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Render `value` as `1234,50`.
pub fn format_money(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string().replace('.', ",")
}

/// Parse a wire literal. Both `150,00` and `150.00` are accepted; thousands separators are not.
pub fn parse_money(text: &str) -> BillingResult<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() || (trimmed.contains(',') && trimmed.contains('.')) {
        return Err(BillingError::InvalidMoney(text.to_string()));
    }

    Decimal::from_str(&trimmed.replace(',', "."))
        .map_err(|_| BillingError::InvalidMoney(text.to_string()))
}
