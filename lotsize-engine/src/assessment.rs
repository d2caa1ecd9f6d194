//! Risk assessment of a calculated position.
//!
//! Scores a risk setup from 0 (benign) to 10 (aggressive) using the risk
//! percent, account size, the pair's typical volatility and how the stop
//! compares with that volatility. Produces plain-language insights and the
//! daily/weekly loss limits that follow from the 2% and 5% rules.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lotsize_domain::PairCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculator::Calculation;
use crate::error::{EngineError, EngineResult};

/// Bundled typical daily ranges in pips.
pub const BUNDLED_VOLATILITY: &str = include_str!("../data/volatility.json");

/// Volatility assumed for pairs missing from the table, in pips
pub const DEFAULT_VOLATILITY: Decimal = dec!(100);

const MAX_SCORE: u8 = 10;
// Fractions of balance; below one, so the products stay in range
const DAILY_LOSS_LIMIT_RATE: Decimal = dec!(0.02);
const WEEKLY_LOSS_LIMIT_RATE: Decimal = dec!(0.05);

// =============================================================================
// Volatility table
// =============================================================================

/// Typical daily range of a pair, in pips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volatility {
    /// Quiet-market range
    pub low: Decimal,
    /// Busy-market range
    pub high: Decimal,
    /// Range used for scoring
    pub current: Decimal,
}

/// Pair → typical volatility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolatilityTable {
    entries: BTreeMap<String, Volatility>,
}

impl VolatilityTable {
    /// Load the table shipped with the crate.
    pub fn bundled() -> EngineResult<Self> {
        Self::from_json_str(BUNDLED_VOLATILITY)
    }

    /// Load a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| EngineError::VolatilityTable(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Parse `{"PAIR": {"low": .., "high": .., "current": ..}}`.
    ///
    /// # Errors
    /// Returns `EngineError::VolatilityTable` for malformed JSON or a
    /// non-positive current volatility.
    pub fn from_json_str(raw: &str) -> EngineResult<Self> {
        let parsed: BTreeMap<String, Volatility> =
            serde_json::from_str(raw).map_err(|e| EngineError::VolatilityTable(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for (pair, volatility) in parsed {
            if volatility.current <= Decimal::ZERO {
                return Err(EngineError::VolatilityTable(format!(
                    "{}: current volatility must be positive",
                    pair
                )));
            }
            entries.insert(pair.to_uppercase(), volatility);
        }

        Ok(Self { entries })
    }

    /// Volatility entry for a pair
    pub fn get(&self, pair: &PairCode) -> Option<&Volatility> {
        self.entries.get(pair.as_str())
    }

    /// Current volatility for a pair, or [`DEFAULT_VOLATILITY`]
    pub fn current(&self, pair: &PairCode) -> Decimal {
        self.get(pair).map(|v| v.current).unwrap_or(DEFAULT_VOLATILITY)
    }

    /// Number of pairs in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no pairs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Assessment
// =============================================================================

/// Coarse risk level derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Score below 5
    Low,
    /// Score 5 to 7
    Medium,
    /// Score 8 and above
    High,
}

impl RiskLevel {
    /// Level for a 0..=10 score
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=4 => RiskLevel::Low,
            5..=7 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Advice attached to an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insight {
    /// Score of 7 or more
    ReduceRisk,
    /// Small account holding more than 0.1 lots
    ConsiderMicroLots,
    /// Stop below 70% of typical volatility
    StopTooTight,
    /// Risk below 0.5%
    VeryConservative,
    /// Nothing else fired
    Balanced,
}

impl Insight {
    /// Human-readable advice
    pub fn message(&self) -> &'static str {
        match self {
            Insight::ReduceRisk => {
                "Consider reducing risk percentage for better capital preservation"
            }
            Insight::ConsiderMicroLots => {
                "High position size relative to account balance - consider micro lots"
            }
            Insight::StopTooTight => "Stop loss may be too tight for current market volatility",
            Insight::VeryConservative => {
                "Very conservative risk level - consider increasing slightly for better returns"
            }
            Insight::Balanced => "Your risk parameters look well balanced!",
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of assessing one calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Risk score, 0..=10
    pub score: u8,
    /// Level derived from the score
    pub level: RiskLevel,
    /// Typical volatility of the pair used for scoring
    pub volatility: Decimal,
    /// Advice, never empty
    pub insights: Vec<Insight>,
    /// 2% of balance
    pub daily_loss_limit: Decimal,
    /// 5% of balance
    pub weekly_loss_limit: Decimal,
}

// =============================================================================
// RiskAssessor
// =============================================================================

/// Scores calculated positions against a volatility table.
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    volatility: Arc<VolatilityTable>,
}

impl RiskAssessor {
    /// Create an assessor over a volatility table.
    pub fn new(volatility: Arc<VolatilityTable>) -> Self {
        Self { volatility }
    }

    /// The volatility table in use
    pub fn volatility(&self) -> &VolatilityTable {
        &self.volatility
    }

    /// Risk score in 0..=10.
    pub fn score(
        &self,
        balance: Decimal,
        risk_percent: Decimal,
        pair: &PairCode,
        stop_loss: Decimal,
    ) -> u8 {
        let volatility = self.volatility.current(pair);
        let mut score: u8 = 0;

        score += if risk_percent > dec!(5) {
            4
        } else if risk_percent > dec!(3) {
            2
        } else if risk_percent > dec!(1) {
            1
        } else {
            0
        };

        // Smaller accounts carry more relative risk
        score += if balance < dec!(1000) {
            3
        } else if balance < dec!(5000) {
            2
        } else if balance < dec!(10000) {
            1
        } else {
            0
        };

        score += if volatility > dec!(100) {
            2
        } else if volatility > dec!(80) {
            1
        } else {
            0
        };

        score += if stop_loss < volatility * dec!(0.5) {
            2
        } else if stop_loss < volatility * dec!(0.8) {
            1
        } else {
            0
        };

        score.min(MAX_SCORE)
    }

    /// Assess a completed calculation.
    pub fn assess(&self, calculation: &Calculation) -> Assessment {
        let volatility = self.volatility.current(&calculation.pair);
        let score = self.score(
            calculation.balance,
            calculation.risk_percent,
            &calculation.pair,
            calculation.stop_loss,
        );

        let mut insights = Vec::new();
        if score >= 7 {
            insights.push(Insight::ReduceRisk);
        }
        if calculation.balance < dec!(1000) && calculation.recommended_lot > dec!(0.1) {
            insights.push(Insight::ConsiderMicroLots);
        }
        if calculation.stop_loss < volatility * dec!(0.7) {
            insights.push(Insight::StopTooTight);
        }
        if calculation.risk_percent < dec!(0.5) {
            insights.push(Insight::VeryConservative);
        }
        if insights.is_empty() {
            insights.push(Insight::Balanced);
        }

        Assessment {
            score,
            level: RiskLevel::from_score(score),
            volatility,
            insights,
            daily_loss_limit: calculation.balance * DAILY_LOSS_LIMIT_RATE,
            weekly_loss_limit: calculation.balance * WEEKLY_LOSS_LIMIT_RATE,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
