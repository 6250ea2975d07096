//! Monetary arithmetic helpers.
//!
//! Uses rust_decimal for precise calculations, stores as f64.
//! Rounding is 2 decimal places, half-up.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round an f64 amount to 2 decimal places, half-up
#[inline]
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// floor(amount / divisor) as an integer, computed in Decimal
pub fn floor_div(amount: f64, divisor: u32) -> i64 {
    if divisor == 0 {
        return 0;
    }
    (to_decimal(amount) / Decimal::from(divisor))
        .floor()
        .to_i64()
        .unwrap_or(0)
}
