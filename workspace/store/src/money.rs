//! Exact parsing of money amounts.

use std::str::FromStr;

use common::FieldError;
use rust_decimal::Decimal;

/// Largest amount a `Decimal(12,2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Parses a non-negative decimal amount with at most two fractional digits
/// and at most ten integer digits.
///
/// `field` is the wire name reported back when the text is rejected.
pub fn parse_money(field: &str, text: &str) -> Result<Decimal, FieldError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FieldError::new(field, "Amount is required"));
    }

    let value = Decimal::from_str(text)
        .map_err(|_| FieldError::new(field, "Amount must be a decimal number"))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(FieldError::new(field, "Amount cannot be negative"));
    }
    if value.normalize().scale() > 2 {
        return Err(FieldError::new(
            field,
            "Amount cannot have more than two decimal places",
        ));
    }

    if value > MAX_AMOUNT {
        return Err(FieldError::new(field, "Amount cannot exceed 9999999999.99"));
    }

    Ok(value.normalize())
}

/// Snaps a stored amount to cents. SQLite keeps decimals as REAL, so values
/// read back may carry binary noise.
pub fn normalize(value: Decimal) -> Decimal {
    value.round_dp(2).normalize()
}
