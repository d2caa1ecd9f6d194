//! Value Objects for the Lotsize Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Lot step must be positive
    #[error("Invalid lot step: {0}")]
    InvalidLotStep(String),

    /// Pip value must be positive
    #[error("Invalid pip value: {0}")]
    InvalidPipValue(String),
}

// =============================================================================
// PairCode
// =============================================================================

/// PairCode is a currency-pair code as used for pip-value lookup (e.g. EURUSD)
///
/// # Invariants
/// - Always uppercase
/// - May be empty (no pair supplied)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairCode(String);

impl PairCode {
    /// Create a PairCode, uppercasing the input
    ///
    /// # Examples
    /// ```
    /// # use lotsize_domain::value_objects::PairCode;
    /// let pair = PairCode::new("eurusd");
    /// assert_eq!(pair.as_str(), "EURUSD");
    /// ```
    pub fn new(code: &str) -> Self {
        Self(code.to_uppercase())
    }

    /// Read a PairCode from a loosely-typed request value
    ///
    /// Only strings carry a pair; null, numbers and anything else become empty.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(code) => Self::new(code),
            _ => Self::default(),
        }
    }

    /// Get the pair code as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no pair was supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PairCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// LotStep
// =============================================================================

/// LotStep is the minimum increment by which a position size can change
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotStep(Decimal);

impl LotStep {
    /// Step used when the caller supplies none (0.01 lots, a micro lot)
    pub const DEFAULT: LotStep = LotStep(dec!(0.01));

    /// Create a new LotStep with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidLotStep` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidLotStep(format!(
                "Lot step must be positive, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Integer scaling factor `floor(1 / step)`
    ///
    /// For steps that are exact inverses of an integer (0.01, 0.1, 0.001)
    /// this is exactly the number of steps per lot. Steps above one lot
    /// yield zero.
    ///
    /// # Examples
    /// ```
    /// # use lotsize_domain::value_objects::LotStep;
    /// # use rust_decimal_macros::dec;
    /// assert_eq!(LotStep::new(dec!(0.01)).unwrap().inverse_factor(), Some(dec!(100)));
    /// assert_eq!(LotStep::new(dec!(0.03)).unwrap().inverse_factor(), Some(dec!(33)));
    /// assert_eq!(LotStep::new(dec!(2)).unwrap().inverse_factor(), Some(dec!(0)));
    /// ```
    pub fn inverse_factor(&self) -> Option<Decimal> {
        Decimal::ONE.checked_div(self.0).map(|inverse| inverse.floor())
    }
}

impl Default for LotStep {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LotStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    // PairCode tests
    #[test]
    fn test_pair_code_uppercases() {
        assert_eq!(PairCode::new("eurusd").as_str(), "EURUSD");
        assert_eq!(PairCode::new("GbpUsd").as_str(), "GBPUSD");
        assert_eq!(PairCode::new("USDJPY").to_string(), "USDJPY");
    }

    #[test]
    fn test_pair_code_from_value() {
        assert_eq!(PairCode::from_value(&json!("usdchf")).as_str(), "USDCHF");
        assert!(PairCode::from_value(&Value::Null).is_empty());
        assert!(PairCode::from_value(&json!(42)).is_empty());
        assert!(PairCode::from_value(&json!(["EURUSD"])).is_empty());
    }

    // LotStep tests
    #[test]
    fn test_lot_step_validation() {
        assert!(LotStep::new(dec!(0.01)).is_ok());
        assert!(LotStep::new(dec!(1)).is_ok());
        assert!(LotStep::new(dec!(0)).is_err());
        assert!(LotStep::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_lot_step_default() {
        assert_eq!(LotStep::DEFAULT.as_decimal(), dec!(0.01));
        assert_eq!(LotStep::default(), LotStep::DEFAULT);
    }

    #[test]
    fn test_lot_step_inverse_factor() {
        let factor = |step| LotStep::new(step).unwrap().inverse_factor().unwrap();

        assert_eq!(factor(dec!(0.01)), dec!(100));
        assert_eq!(factor(dec!(0.1)), dec!(10));
        assert_eq!(factor(dec!(0.001)), dec!(1000));
        assert_eq!(factor(dec!(1)), dec!(1));

        // Not an inverse of an integer: snaps to 1/33
        assert_eq!(factor(dec!(0.03)), dec!(33));

        // Larger than a lot
        assert_eq!(factor(dec!(5)), dec!(0));
    }
}
