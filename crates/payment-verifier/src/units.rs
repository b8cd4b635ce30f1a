//! Conversion between human-readable decimal amounts and integer smallest units.
//!
//! All amount matching happens on integers; `Decimal` only appears at the
//! edges (configuration, user-facing text).

use crate::error::UnitsError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Largest scale a `Decimal` can represent.
const MAX_SCALE: u32 = 28;

fn scale_factor(decimals: u32) -> Result<Decimal, UnitsError> {
    if decimals > MAX_SCALE {
        return Err(UnitsError::UnsupportedScale(decimals));
    }
    Decimal::try_from_i128_with_scale(10i128.pow(decimals), 0)
        .map_err(|_| UnitsError::UnsupportedScale(decimals))
}

/// Convert an exact decimal amount to smallest units.
///
/// Fails if the amount carries more precision than `decimals` allows.
pub fn to_smallest_unit(amount: Decimal, decimals: u32) -> Result<u128, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative);
    }
    let scaled = amount
        .checked_mul(scale_factor(decimals)?)
        .ok_or(UnitsError::Overflow)?;
    if !scaled.fract().is_zero() {
        return Err(UnitsError::Precision { decimals });
    }
    scaled.to_u128().ok_or(UnitsError::Overflow)
}

/// Convert a decimal amount to smallest units, dropping sub-unit precision.
pub fn to_smallest_unit_floor(amount: Decimal, decimals: u32) -> Result<u128, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative);
    }
    let scaled = amount
        .checked_mul(scale_factor(decimals)?)
        .ok_or(UnitsError::Overflow)?;
    scaled.trunc().to_u128().ok_or(UnitsError::Overflow)
}

/// Convert smallest units back to a decimal amount.
///
/// Returns `None` for values beyond `Decimal`'s 96-bit mantissa.
pub fn to_decimal(amount: u128, decimals: u32) -> Option<Decimal> {
    if decimals > MAX_SCALE {
        return None;
    }
    let mantissa = i128::try_from(amount).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .ok()
        .map(|d| d.normalize())
}

/// Whether `actual` lies within `[expected - tolerance, expected + tolerance]`.
pub fn within_tolerance(actual: u128, expected: u128, tolerance: u128) -> bool {
    actual >= expected.saturating_sub(tolerance) && actual <= expected.saturating_add(tolerance)
}
