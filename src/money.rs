//! Monetary amounts are stored as integer cents and only become decimal
//! values at the API boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::errors::AppError;

/// Convert stored cents into a two-decimal value for responses.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Convert a client-provided amount into cents.
///
/// Sub-cent precision is rejected rather than silently rounded.
pub fn decimal_to_cents(value: Decimal) -> Result<i64, AppError> {
    let scaled = value * Decimal::ONE_HUNDRED;
    if scaled.fract() != Decimal::ZERO {
        return Err(AppError::ValidationError(
            "Amounts cannot have more than two decimal places".to_string(),
        ));
    }
    scaled
        .trunc()
        .to_i64()
        .ok_or_else(|| AppError::ValidationError("Amount out of range".to_string()))
}

/// Percentage of `part` over `whole`, or `None` when `whole` is zero.
/// Normalized so trailing zeros don't leak into responses.
pub fn percentage_of(part: i64, whole: i64) -> Option<Decimal> {
    if whole == 0 {
        return None;
    }
    Some((Decimal::from(part) / Decimal::from(whole.abs()) * Decimal::ONE_HUNDRED).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cents_to_decimal_two_places() {
        assert_eq!(cents_to_decimal(123456).to_string(), "1234.56");
        assert_eq!(cents_to_decimal(-50).to_string(), "-0.50");
        assert_eq!(cents_to_decimal(0).to_string(), "0.00");
    }

    #[test]
    fn test_decimal_to_cents_round_trip() {
        let cents = decimal_to_cents(Decimal::from_str("19.99").unwrap()).unwrap();
        assert_eq!(cents, 1999);
        assert_eq!(cents_to_decimal(cents).to_string(), "19.99");
    }

    #[test]
    fn test_decimal_to_cents_rejects_sub_cent() {
        let result = decimal_to_cents(Decimal::from_str("10.001").unwrap());
        assert!(result.is_err(), "Sub-cent amounts should be rejected");
    }

    #[test]
    fn test_decimal_to_cents_negative() {
        let cents = decimal_to_cents(Decimal::from_str("-3.25").unwrap()).unwrap();
        assert_eq!(cents, -325);
    }

    #[test]
    fn test_percentage_of_zero_whole_is_none() {
        assert_eq!(percentage_of(100, 0), None);
    }

    #[test]
    fn test_percentage_of_uses_absolute_base() {
        // A gain against a negative starting point still reports a positive change
        let pct = percentage_of(50, -200).unwrap();
        assert_eq!(pct, Decimal::from(25));
    }
}
