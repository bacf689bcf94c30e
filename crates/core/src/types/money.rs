//! Euro amounts.
//!
//! Amounts are `Decimal` values in euros, serialised as strings so the
//! document store never rounds them through a float.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to cents, half away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount the way receipts print it: `1 234,50 €`.
///
/// ```
/// use rust_decimal::Decimal;
/// use sav_core::format_eur;
///
/// assert_eq!(format_eur(Decimal::new(123_450, 2)), "1 234,50 €");
/// assert_eq!(format_eur(Decimal::new(-75, 1)), "-7,50 €");
/// ```
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    let rounded = round_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (units, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, c) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    format!("{}{grouped},{cents} €", if negative { "-" } else { "" })
}
