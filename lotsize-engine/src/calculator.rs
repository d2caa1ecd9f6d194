//! Risk Calculator: risk budget → recommended lot size.
//!
//! ```text
//! money_risk         = balance × (risk_percent / 100)
//! raw_lots           = money_risk / (stop_loss × pip_value)
//! recommended_lot    = raw_lots floored to the lot step (never below zero)
//! pip_value_position = pip_value × recommended_lot
//! ```
//!
//! All arithmetic is exact decimal arithmetic; nothing here is rounded for
//! presentation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use lotsize_domain::{LooseRiskInputs, LotStep, PairCode, RiskInputs};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::pip_table::PipValueSource;

// =============================================================================
// Configuration
// =============================================================================

/// How raw lots are floored to the lot step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepRounding {
    /// `floor(raw × f) / f` with `f = floor(1 / step)`.
    ///
    /// Exact for steps like 0.01 or 0.1. A step such as 0.03 snaps to 1/33.
    /// Steps above one lot (f = 0) are floored with [`StepRounding::ExactStep`].
    #[default]
    InverseFactor,
    /// `floor(raw / step) × step`, exact for any step.
    ExactStep,
}

impl FromStr for StepRounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "factor" | "inverse_factor" => Ok(Self::InverseFactor),
            "exact" | "exact_step" => Ok(Self::ExactStep),
            other => Err(format!("unknown step rounding: {}. Expected: factor, exact", other)),
        }
    }
}

impl fmt::Display for StepRounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepRounding::InverseFactor => write!(f, "factor"),
            StepRounding::ExactStep => write!(f, "exact"),
        }
    }
}

/// Calculator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatorConfig {
    /// Pip value for pairs missing from the table
    pub default_pip_value: Decimal,
    /// Lot step used when the request supplies none
    pub default_lot_step: LotStep,
    /// Flooring strategy
    pub step_rounding: StepRounding,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_pip_value: dec!(10),
            default_lot_step: LotStep::DEFAULT,
            step_rounding: StepRounding::InverseFactor,
        }
    }
}

// =============================================================================
// Calculation
// =============================================================================

/// Where the pip value used in a calculation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipSource {
    /// Caller override (`custom_pip > 0`)
    Custom,
    /// Pip-value table entry for the pair
    Table,
    /// Pair unknown, configured default used
    Default,
}

impl fmt::Display for PipSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipSource::Custom => write!(f, "custom"),
            PipSource::Table => write!(f, "table"),
            PipSource::Default => write!(f, "default"),
        }
    }
}

/// Outcome of one calculation, unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    /// Normalized balance
    pub balance: Decimal,
    /// Normalized risk percent
    pub risk_percent: Decimal,
    /// Money at risk: balance × risk_percent / 100
    pub money_risk: Decimal,
    /// Normalized stop-loss distance in pips
    pub stop_loss: Decimal,
    /// Uppercased pair
    pub pair: PairCode,
    /// Pip value per standard lot actually used
    pub pip_value_per_lot: Decimal,
    /// Origin of `pip_value_per_lot`
    pub pip_source: PipSource,
    /// Lot step actually used
    pub lot_step: LotStep,
    /// Unfloored lot size
    pub raw_lots: Decimal,
    /// Largest step multiple not above `raw_lots`, never negative
    pub recommended_lot: Decimal,
    /// Value of one pip at the recommended size
    pub pip_value_position: Decimal,
}

// =============================================================================
// RiskCalculator
// =============================================================================

/// Converts a risk budget into a recommended position size.
///
/// Pure: the only state is the injected pip-value source and settings.
#[derive(Clone)]
pub struct RiskCalculator {
    pip_values: Arc<dyn PipValueSource>,
    config: CalculatorConfig,
}

impl RiskCalculator {
    /// Create a calculator over a pip-value source.
    pub fn new(pip_values: Arc<dyn PipValueSource>, config: CalculatorConfig) -> Self {
        Self { pip_values, config }
    }

    /// Calculator settings
    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// The injected pip-value source
    pub fn pip_values(&self) -> &dyn PipValueSource {
        self.pip_values.as_ref()
    }

    /// Normalize raw request fields using this calculator's default lot step.
    pub fn normalize(&self, loose: &LooseRiskInputs) -> RiskInputs {
        RiskInputs::normalize(loose, self.config.default_lot_step)
    }

    /// Resolve the pip value per standard lot.
    ///
    /// A positive `custom_pip` wins over the table; unknown pairs use the
    /// configured default.
    pub fn resolve_pip_value(&self, pair: &PairCode, custom_pip: Decimal) -> (Decimal, PipSource) {
        if custom_pip > Decimal::ZERO {
            return (custom_pip, PipSource::Custom);
        }

        match self.pip_values.pip_value(pair) {
            Some(value) => (value, PipSource::Table),
            None => (self.config.default_pip_value, PipSource::Default),
        }
    }

    /// Run the calculation.
    ///
    /// # Errors
    /// - `EngineError::Validation` if `stop_loss <= 0` or the resolved pip value `<= 0`
    /// - `EngineError::Overflow` if an intermediate value leaves the decimal range
    pub fn calculate(&self, inputs: &RiskInputs) -> EngineResult<Calculation> {
        let (pip_value, pip_source) = self.resolve_pip_value(&inputs.pair, inputs.custom_pip);

        if inputs.stop_loss <= Decimal::ZERO || pip_value <= Decimal::ZERO {
            return Err(EngineError::Validation {
                stop_loss: inputs.stop_loss,
                pip_value,
            });
        }

        let money_risk = inputs
            .balance
            .checked_mul(inputs.risk_percent / dec!(100))
            .ok_or(EngineError::Overflow("money_risk"))?;

        let raw_lots = inputs
            .stop_loss
            .checked_mul(pip_value)
            .and_then(|risk_per_lot| money_risk.checked_div(risk_per_lot))
            .ok_or(EngineError::Overflow("raw_lots"))?;

        let recommended_lot = floor_to_step(raw_lots, inputs.lot_step, self.config.step_rounding);

        let pip_value_position = pip_value
            .checked_mul(recommended_lot)
            .ok_or(EngineError::Overflow("pip_value_position"))?;

        debug!(
            pair = %inputs.pair,
            %pip_source,
            %pip_value,
            %money_risk,
            %raw_lots,
            %recommended_lot,
            "Lot size calculated"
        );

        Ok(Calculation {
            balance: inputs.balance,
            risk_percent: inputs.risk_percent,
            money_risk,
            stop_loss: inputs.stop_loss,
            pair: inputs.pair.clone(),
            pip_value_per_lot: pip_value,
            pip_source,
            lot_step: inputs.lot_step,
            raw_lots,
            recommended_lot,
            pip_value_position,
        })
    }
}

impl fmt::Debug for RiskCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskCalculator")
            .field("pairs", &self.pip_values.pairs().len())
            .field("config", &self.config)
            .finish()
    }
}

/// Floor `raw_lots` to a multiple of `step`, toward zero, never below zero.
///
/// When the number of steps does not fit in a `Decimal` the step is finer
/// than the precision of `raw_lots`, which is then truncated to the step's
/// decimal places.
///
/// # Examples
/// ```
/// # use lotsize_domain::LotStep;
/// # use lotsize_engine::calculator::{floor_to_step, StepRounding};
/// # use rust_decimal_macros::dec;
/// let step = LotStep::new(dec!(0.01)).unwrap();
/// assert_eq!(floor_to_step(dec!(0.4999), step, StepRounding::InverseFactor), dec!(0.49));
///
/// let odd = LotStep::new(dec!(0.03)).unwrap();
/// assert_eq!(floor_to_step(dec!(0.1), odd, StepRounding::ExactStep), dec!(0.09));
/// ```
pub fn floor_to_step(raw_lots: Decimal, step: LotStep, rounding: StepRounding) -> Decimal {
    if raw_lots <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let by_factor = match rounding {
        StepRounding::InverseFactor => step
            .inverse_factor()
            .filter(|f| *f >= Decimal::ONE)
            .and_then(|factor| {
                raw_lots
                    .checked_mul(factor)
                    .and_then(|scaled| scaled.floor().checked_div(factor))
            }),
        StepRounding::ExactStep => None,
    };

    let step = step.as_decimal();
    by_factor
        .or_else(|| {
            raw_lots
                .checked_div(step)
                .and_then(|steps| steps.floor().checked_mul(step))
        })
        .unwrap_or_else(|| raw_lots.round_dp_with_strategy(step.scale(), RoundingStrategy::ToZero))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip_table::PipValueTable;
    use serde_json::json;

    fn calculator() -> RiskCalculator {
        RiskCalculator::new(
            Arc::new(PipValueTable::bundled().unwrap()),
            CalculatorConfig::default(),
        )
    }

    fn inputs(value: serde_json::Value) -> RiskInputs {
        let loose: LooseRiskInputs = serde_json::from_value(value).unwrap();
        calculator().normalize(&loose)
    }

    /// Source that knows every pair and prices it at a fixed value.
    struct FlatSource(Decimal);

    impl PipValueSource for FlatSource {
        fn pip_value(&self, _pair: &PairCode) -> Option<Decimal> {
            Some(self.0)
        }

        fn pairs(&self) -> Vec<(String, Decimal)> {
            Vec::new()
        }
    }

    #[test]
    fn test_eurusd_half_lot() {
        let calc = calculator()
            .calculate(&inputs(json!({
                "balance": 10000,
                "risk_percent": 1,
                "stop_loss": 20,
                "pair": "EURUSD",
                "lot_step": 0.01
            })))
            .unwrap();

        assert_eq!(calc.money_risk, dec!(100));
        assert_eq!(calc.pip_value_per_lot, dec!(10));
        assert_eq!(calc.pip_source, PipSource::Table);
        assert_eq!(calc.raw_lots, dec!(0.5));
        assert_eq!(calc.recommended_lot, dec!(0.5));
        assert_eq!(calc.pip_value_position, dec!(5));
    }

    #[test]
    fn test_zero_stop_loss_rejected() {
        let result = calculator().calculate(&inputs(json!({
            "balance": 5000,
            "risk_percent": 2,
            "stop_loss": 0,
            "pair": "GBPUSD"
        })));

        let err = result.unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "stop_loss and pip_value must be > 0");
    }

    #[test]
    fn test_negative_stop_loss_rejected() {
        let result = calculator().calculate(&inputs(json!({
            "balance": 5000,
            "risk_percent": 2,
            "stop_loss": "-10",
            "pair": "GBPUSD"
        })));

        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_non_positive_pip_value_rejected() {
        let calculator =
            RiskCalculator::new(Arc::new(FlatSource(Decimal::ZERO)), CalculatorConfig::default());
        let inputs = calculator.normalize(
            &serde_json::from_value::<LooseRiskInputs>(json!({
                "balance": 1000,
                "risk_percent": 1,
                "stop_loss": 10
            }))
            .unwrap(),
        );

        match calculator.calculate(&inputs) {
            Err(EngineError::Validation { stop_loss, pip_value }) => {
                assert_eq!(stop_loss, dec!(10));
                assert_eq!(pip_value, Decimal::ZERO);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_pair_uses_default_pip_value() {
        let calc = calculator()
            .calculate(&inputs(json!({
                "balance": 10000,
                "risk_percent": 1,
                "stop_loss": 50,
                "pair": "XXXYYY",
                "lot_step": 0.1
            })))
            .unwrap();

        assert_eq!(calc.pip_value_per_lot, dec!(10));
        assert_eq!(calc.pip_source, PipSource::Default);
        assert_eq!(calc.money_risk, dec!(100));
        assert_eq!(calc.raw_lots, dec!(0.2));
        assert_eq!(calc.recommended_lot, dec!(0.2));
    }

    #[test]
    fn test_empty_pair_uses_default_pip_value() {
        let calc = calculator()
            .calculate(&inputs(json!({"balance": 1000, "risk_percent": 1, "stop_loss": 10})))
            .unwrap();

        assert!(calc.pair.is_empty());
        assert_eq!(calc.pip_source, PipSource::Default);
        assert_eq!(calc.recommended_lot, dec!(0.1));
    }

    #[test]
    fn test_custom_pip_overrides_table() {
        let calc = calculator()
            .calculate(&inputs(json!({
                "balance": 10000,
                "risk_percent": 1,
                "stop_loss": 20,
                "pair": "EURUSD",
                "custom_pip": 12
            })))
            .unwrap();

        assert_eq!(calc.pip_value_per_lot, dec!(12));
        assert_eq!(calc.pip_source, PipSource::Custom);
        // 100 / (20 × 12) = 0.41666… → 0.41
        assert_eq!(calc.recommended_lot, dec!(0.41));
        assert_eq!(calc.pip_value_position, dec!(4.92));
    }

    #[test]
    fn test_non_positive_custom_pip_is_ignored() {
        let calc = calculator();
        let pair = PairCode::new("USDJPY");

        assert_eq!(calc.resolve_pip_value(&pair, dec!(-5)), (dec!(9.13), PipSource::Table));
        assert_eq!(calc.resolve_pip_value(&pair, Decimal::ZERO), (dec!(9.13), PipSource::Table));
    }

    #[test]
    fn test_lowercase_pair_matches_table() {
        let calc = calculator()
            .calculate(&inputs(json!({
                "balance": 10000,
                "risk_percent": 1,
                "stop_loss": 20,
                "pair": "eurgbp"
            })))
            .unwrap();

        assert_eq!(calc.pair.as_str(), "EURGBP");
        assert_eq!(calc.pip_value_per_lot, dec!(8.6));
        // 100 / 172 = 0.5813… → 0.58
        assert_eq!(calc.recommended_lot, dec!(0.58));
    }

    #[test]
    fn test_string_inputs_with_comma_and_grouping() {
        let calc = calculator()
            .calculate(&inputs(json!({
                "balance": "10 000",
                "risk_percent": "1,5",
                "stop_loss": "30",
                "pair": "EURUSD"
            })))
            .unwrap();

        assert_eq!(calc.balance, dec!(10000));
        assert_eq!(calc.risk_percent, dec!(1.5));
        assert_eq!(calc.money_risk, dec!(150));
        assert_eq!(calc.recommended_lot, dec!(0.5));
    }

    #[test]
    fn test_malformed_balance_gives_zero_result() {
        let calc = calculator()
            .calculate(&inputs(json!({
                "balance": "abc",
                "risk_percent": 1,
                "stop_loss": 20,
                "pair": "EURUSD"
            })))
            .unwrap();

        assert_eq!(calc.balance, Decimal::ZERO);
        assert_eq!(calc.money_risk, Decimal::ZERO);
        assert_eq!(calc.recommended_lot, Decimal::ZERO);
        assert_eq!(calc.pip_value_position, Decimal::ZERO);
    }

    #[test]
    fn test_negative_balance_clamps_to_zero_lots() {
        let calc = calculator()
            .calculate(&inputs(json!({
                "balance": -10000,
                "risk_percent": 1,
                "stop_loss": 20,
                "pair": "EURUSD"
            })))
            .unwrap();

        assert_eq!(calc.money_risk, dec!(-100));
        assert_eq!(calc.recommended_lot, Decimal::ZERO);
    }

    #[test]
    fn test_money_risk_independent_of_pair() {
        let calc = calculator();
        for pair in ["EURUSD", "USDJPY", "EURGBP", "XXXYYY"] {
            let result = calc
                .calculate(&inputs(json!({
                    "balance": 2500,
                    "risk_percent": 2,
                    "stop_loss": 15,
                    "pair": pair
                })))
                .unwrap();
            assert_eq!(result.money_risk, dec!(50), "pair {}", pair);
        }
    }

    #[test]
    fn test_recommended_lot_is_step_multiple_and_not_above_raw() {
        let calc = calculator();
        for (balance, stop_loss, step) in [
            (10000, 37, "0.01"),
            (7321, 13, "0.1"),
            (123456, 91, "0.001"),
            (999, 7, "1"),
            (50000, 3, "0.5"),
        ] {
            let result = calc
                .calculate(&inputs(json!({
                    "balance": balance,
                    "risk_percent": 1,
                    "stop_loss": stop_loss,
                    "pair": "USDJPY",
                    "lot_step": step
                })))
                .unwrap();

            let factor = result.lot_step.inverse_factor().unwrap();
            let steps = result.recommended_lot * factor;
            assert_eq!(steps, steps.floor(), "balance {} step {}", balance, step);
            assert!(result.recommended_lot >= Decimal::ZERO);
            assert!(result.recommended_lot <= result.raw_lots);
            assert_eq!(
                result.pip_value_position,
                result.pip_value_per_lot * result.recommended_lot
            );
        }
    }

    #[test]
    fn test_floor_to_step_inverse_factor() {
        let step = |s| LotStep::new(s).unwrap();

        assert_eq!(floor_to_step(dec!(0.5), step(dec!(0.01)), StepRounding::InverseFactor), dec!(0.5));
        assert_eq!(floor_to_step(dec!(0.589), step(dec!(0.01)), StepRounding::InverseFactor), dec!(0.58));
        assert_eq!(floor_to_step(dec!(0.29), step(dec!(0.1)), StepRounding::InverseFactor), dec!(0.2));
        assert_eq!(floor_to_step(dec!(0.009), step(dec!(0.01)), StepRounding::InverseFactor), dec!(0));

        // 0.03 snaps to 1/33: floor(0.1 × 33) / 33 = 3/33
        assert_eq!(
            floor_to_step(dec!(0.1), step(dec!(0.03)), StepRounding::InverseFactor),
            dec!(3) / dec!(33)
        );
    }

    #[test]
    fn test_floor_to_step_exact() {
        let step = LotStep::new(dec!(0.03)).unwrap();
        assert_eq!(floor_to_step(dec!(0.1), step, StepRounding::ExactStep), dec!(0.09));

        let micro = LotStep::new(dec!(0.01)).unwrap();
        assert_eq!(floor_to_step(dec!(0.589), micro, StepRounding::ExactStep), dec!(0.58));
    }

    #[test]
    fn test_floor_to_step_above_one_lot() {
        let step = LotStep::new(dec!(2)).unwrap();
        assert_eq!(floor_to_step(dec!(5.5), step, StepRounding::InverseFactor), dec!(4));
        assert_eq!(floor_to_step(dec!(1.5), step, StepRounding::InverseFactor), dec!(0));
    }

    #[test]
    fn test_floor_to_step_tiny_step_falls_back_to_truncation() {
        let step = LotStep::new(dec!(0.0000000000000000000000000001)).unwrap();

        // 100 × 10^28 steps is beyond Decimal range for both strategies
        assert_eq!(floor_to_step(dec!(100), step, StepRounding::InverseFactor), dec!(100));
        assert_eq!(floor_to_step(dec!(100), step, StepRounding::ExactStep), dec!(100));
        assert_eq!(
            floor_to_step(dec!(1.23456789), step, StepRounding::InverseFactor),
            dec!(1.23456789)
        );
    }

    #[test]
    fn test_floor_to_step_negative_clamps() {
        let step = LotStep::DEFAULT;
        assert_eq!(floor_to_step(dec!(-0.57), step, StepRounding::InverseFactor), dec!(0));
        assert_eq!(floor_to_step(dec!(-0.57), step, StepRounding::ExactStep), dec!(0));
    }

    #[test]
    fn test_exact_step_calculator() {
        let calculator = RiskCalculator::new(
            Arc::new(PipValueTable::bundled().unwrap()),
            CalculatorConfig {
                step_rounding: StepRounding::ExactStep,
                ..CalculatorConfig::default()
            },
        );
        let inputs = calculator.normalize(
            &serde_json::from_value::<LooseRiskInputs>(json!({
                "balance": 10000,
                "risk_percent": 1,
                "stop_loss": 100,
                "pair": "EURUSD",
                "lot_step": 0.03
            }))
            .unwrap(),
        );

        // raw 0.1 → three steps of 0.03
        let calc = calculator.calculate(&inputs).unwrap();
        assert_eq!(calc.recommended_lot, dec!(0.09));
    }

    #[test]
    fn test_overflow_reported() {
        let result = calculator().calculate(&inputs(json!({
            "balance": "70000000000000000000000000000",
            "risk_percent": 500,
            "stop_loss": 1,
            "pair": "EURUSD"
        })));

        assert!(matches!(result, Err(EngineError::Overflow("money_risk"))));
    }

    #[test]
    fn test_step_rounding_from_str() {
        assert_eq!("factor".parse::<StepRounding>().unwrap(), StepRounding::InverseFactor);
        assert_eq!("EXACT".parse::<StepRounding>().unwrap(), StepRounding::ExactStep);
        assert!("nearest".parse::<StepRounding>().is_err());
        assert_eq!(StepRounding::ExactStep.to_string(), "exact");
    }
}
