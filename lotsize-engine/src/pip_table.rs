//! Pip-value reference data.
//!
//! The calculator never reaches for a global table. It is handed a
//! [`PipValueSource`], normally a [`PipValueTable`] loaded from the bundled
//! `data/pip_values.json` asset or from a file named in configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lotsize_domain::{parse_decimal, DomainError, PairCode};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// Bundled pip values for one standard lot, in account currency.
pub const BUNDLED_PIP_VALUES: &str = include_str!("../data/pip_values.json");

/// Port for looking up the monetary value of one pip per standard lot.
pub trait PipValueSource: Send + Sync {
    /// Pip value for `pair`, or `None` if the pair is unknown
    fn pip_value(&self, pair: &PairCode) -> Option<Decimal>;

    /// Every known pair with its pip value, sorted by pair code
    fn pairs(&self) -> Vec<(String, Decimal)>;
}

/// Static pair → pip value table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipValueTable {
    values: BTreeMap<String, Decimal>,
}

impl PipValueTable {
    /// Load the table shipped with the crate.
    pub fn bundled() -> EngineResult<Self> {
        Self::from_json_str(BUNDLED_PIP_VALUES)
    }

    /// Load a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| EngineError::PipTable(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Parse a JSON object mapping pair codes to pip values.
    ///
    /// Values may be numbers or numeric strings. Pair codes are uppercased.
    ///
    /// # Errors
    /// Returns `EngineError::PipTable` for malformed JSON or unparseable values,
    /// and `EngineError::Domain` for values that are not positive.
    pub fn from_json_str(raw: &str) -> EngineResult<Self> {
        let entries: BTreeMap<String, Value> =
            serde_json::from_str(raw).map_err(|e| EngineError::PipTable(e.to_string()))?;

        let mut values = BTreeMap::new();
        for (pair, value) in entries {
            let pip_value = match &value {
                Value::Number(number) => parse_decimal(&number.to_string()),
                Value::String(text) => parse_decimal(text),
                _ => None,
            }
            .ok_or_else(|| EngineError::PipTable(format!("{}: not a number: {}", pair, value)))?;

            if pip_value <= Decimal::ZERO {
                return Err(DomainError::InvalidPipValue(format!(
                    "{} must be positive, got {}",
                    pair, pip_value
                ))
                .into());
            }

            values.insert(pair.to_uppercase(), pip_value);
        }

        Ok(Self { values })
    }

    /// Build a table from explicit entries.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(pair, value)| (pair.as_ref().to_uppercase(), value))
                .collect(),
        }
    }

    /// Number of pairs in the table
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the table has no pairs
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PipValueSource for PipValueTable {
    fn pip_value(&self, pair: &PairCode) -> Option<Decimal> {
        self.values.get(pair.as_str()).copied()
    }

    fn pairs(&self) -> Vec<(String, Decimal)> {
        self.values
            .iter()
            .map(|(pair, value)| (pair.clone(), *value))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
