//! Calculation inputs: the loose request shape and its normalized form.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::numeric::coerce_decimal;
use crate::value_objects::{LotStep, PairCode};

/// Request fields exactly as the client sent them.
///
/// Every field is optional and may be a string or a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LooseRiskInputs {
    /// Account balance
    #[serde(default)]
    pub balance: Value,
    /// Risk per trade in percent (1 = 1%)
    #[serde(default)]
    pub risk_percent: Value,
    /// Stop-loss distance in pips
    #[serde(default)]
    pub stop_loss: Value,
    /// Currency pair code
    #[serde(default)]
    pub pair: Value,
    /// Caller-supplied pip value per standard lot
    #[serde(default)]
    pub custom_pip: Value,
    /// Position size granularity
    #[serde(default)]
    pub lot_step: Value,
}

/// Normalized calculation inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskInputs {
    /// Account balance in account currency
    pub balance: Decimal,
    /// Risk per trade in percent (1 = 1%)
    pub risk_percent: Decimal,
    /// Stop-loss distance in pips
    pub stop_loss: Decimal,
    /// Uppercased pair code, possibly empty
    pub pair: PairCode,
    /// Pip value override; only values > 0 take effect
    pub custom_pip: Decimal,
    /// Position size granularity
    pub lot_step: LotStep,
}

impl RiskInputs {
    /// Normalize loose request fields.
    ///
    /// Unparseable numbers become zero. A lot step that is absent or not
    /// positive takes `default_step`.
    ///
    /// # Examples
    /// ```
    /// # use lotsize_domain::{LooseRiskInputs, LotStep, RiskInputs};
    /// # use rust_decimal_macros::dec;
    /// let loose: LooseRiskInputs = serde_json::from_str(
    ///     r#"{"balance": "10 000", "risk_percent": "1,5", "pair": "eurusd"}"#,
    /// ).unwrap();
    /// let inputs = RiskInputs::normalize(&loose, LotStep::DEFAULT);
    ///
    /// assert_eq!(inputs.balance, dec!(10000));
    /// assert_eq!(inputs.risk_percent, dec!(1.5));
    /// assert_eq!(inputs.pair.as_str(), "EURUSD");
    /// assert_eq!(inputs.lot_step, LotStep::DEFAULT);
    /// ```
    pub fn normalize(loose: &LooseRiskInputs, default_step: LotStep) -> Self {
        Self {
            balance: coerce_decimal(&loose.balance),
            risk_percent: coerce_decimal(&loose.risk_percent),
            stop_loss: coerce_decimal(&loose.stop_loss),
            pair: PairCode::from_value(&loose.pair),
            custom_pip: coerce_decimal(&loose.custom_pip),
            lot_step: LotStep::new(coerce_decimal(&loose.lot_step)).unwrap_or(default_step),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
