//! Cent-boundary arithmetic for quote totals.
//!
//! All rounding is half-up to 2 decimal places. Intermediate products keep
//! full decimal precision; only the stored figures are rounded.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half-up on the cent boundary.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `quantity × unit_price × (1 − discount/100)`, rounded to cents.
/// `discount` is a percentage in 0–100.
#[must_use]
pub fn line_total(quantity: Decimal, unit_price: Decimal, discount: Decimal) -> Decimal {
    let factor = (Decimal::ONE_HUNDRED - discount) / Decimal::ONE_HUNDRED;
    round2(quantity * unit_price * factor)
}

/// `(subtotal, tax_amount, total)` for the given line totals and tax rate.
#[must_use]
pub fn totals(line_totals: &[Decimal], tax_rate: Decimal) -> (Decimal, Decimal, Decimal) {
    let subtotal: Decimal = line_totals.iter().copied().sum();
    let tax_amount = round2(subtotal * tax_rate / Decimal::ONE_HUNDRED);
    let total = round2(subtotal + tax_amount);
    (subtotal, tax_amount, total)
}
