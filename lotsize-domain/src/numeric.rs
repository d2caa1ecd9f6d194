//! Lenient numeric coercion for client-supplied values.
//!
//! Request fields arrive as JSON numbers or as strings typed by a person.
//! Anything that cannot be read as a decimal becomes zero; callers never see
//! a parse error.
//!
//! # Separator policy
//!
//! - A comma is always a decimal point: `"1,5"` reads as 1.5.
//! - Whitespace inside the string is digit grouping: `"10 000"` reads as 10000.
//! - Comma-grouped thousands are therefore NOT supported: `"10,000"` reads as
//!   10.000 and `"1,000,000"` does not parse at all (coerces to zero).

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Largest exponent magnitude accepted in scientific notation.
const MAX_EXPONENT: u32 = 28;

/// Parse a human-typed decimal string.
///
/// Returns `None` when the text is not a finite decimal representable by
/// [`Decimal`].
///
/// # Examples
/// ```
/// # use lotsize_domain::numeric::parse_decimal;
/// # use rust_decimal_macros::dec;
/// assert_eq!(parse_decimal("1,5"), Some(dec!(1.5)));
/// assert_eq!(parse_decimal(" 10 000 "), Some(dec!(10000)));
/// assert_eq!(parse_decimal("abc"), None);
/// ```
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .ok()
        .or_else(|| parse_scientific(&cleaned))
}

fn parse_scientific(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = text.split_once(|c| c == 'e' || c == 'E')?;
    let mantissa = Decimal::from_str(mantissa).ok()?;
    let exponent: i32 = exponent.parse().ok()?;

    if exponent.unsigned_abs() > MAX_EXPONENT {
        return None;
    }

    let power = (0..exponent.unsigned_abs())
        .try_fold(Decimal::ONE, |acc, _| acc.checked_mul(Decimal::from(10)))?;

    if exponent >= 0 {
        mantissa.checked_mul(power)
    } else {
        mantissa.checked_div(power)
    }
}

/// Coerce any JSON value to a decimal, falling back to zero.
///
/// Numbers and strings go through [`parse_decimal`]; null, booleans, arrays
/// and objects are zero.
pub fn coerce_decimal(value: &Value) -> Decimal {
    let parsed = match value {
        Value::Number(number) => parse_decimal(&number.to_string()),
        Value::String(text) => parse_decimal(text),
        _ => None,
    };

    parsed.unwrap_or(Decimal::ZERO)
}

// =============================================================================
// Tests
// =============================================================================
