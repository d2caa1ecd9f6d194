//! Lotsize Engine Layer
//!
//! Pure decision logic, deterministic, no I/O beyond loading reference tables.
//! Takes normalized inputs → returns a recommended lot size and its assessment.

#![warn(clippy::all)]

pub mod assessment;
pub mod calculator;
pub mod error;
pub mod pip_table;

pub use assessment::{
    Assessment, Insight, RiskAssessor, RiskLevel, Volatility, VolatilityTable, DEFAULT_VOLATILITY,
};
pub use calculator::{
    floor_to_step, Calculation, CalculatorConfig, PipSource, RiskCalculator, StepRounding,
};
pub use error::{EngineError, EngineResult};
pub use pip_table::{PipValueSource, PipValueTable};
