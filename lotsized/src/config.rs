//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use lotsize_domain::LotStep;
use lotsize_engine::{CalculatorConfig, StepRounding};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Engine configuration
    pub engine: EngineConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Pip value per lot for pairs missing from the table
    pub default_pip_value: Decimal,
    /// Lot step used when a request supplies none
    pub default_lot_step: LotStep,
    /// Flooring strategy for lot sizes
    pub step_rounding: StepRounding,
    /// Pip-value table file; bundled table when unset
    pub pip_table_path: Option<PathBuf>,
    /// Volatility table file; bundled table when unset
    pub volatility_table_path: Option<PathBuf>,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment (JSON logs)
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> DaemonResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::load_environment(&lookup)?;
        let api = Self::load_api_config(&lookup)?;
        let engine = Self::load_engine_config(&lookup)?;

        Ok(Self {
            api,
            engine,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            engine: EngineConfig::default(),
            environment: Environment::Test,
        }
    }

    fn load_environment<F>(lookup: &F) -> DaemonResult<Environment>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("LOTSIZE_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid LOTSIZE_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config<F>(lookup: &F) -> DaemonResult<ApiConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("LOTSIZE_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port_str = lookup("LOTSIZE_API_PORT").unwrap_or_else(|| "5003".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| DaemonError::Config(format!("Invalid LOTSIZE_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_engine_config<F>(lookup: &F) -> DaemonResult<EngineConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_pip_value = Self::load_decimal(lookup, "LOTSIZE_DEFAULT_PIP_VALUE", dec!(10))?;
        if default_pip_value <= Decimal::ZERO {
            return Err(DaemonError::Config(format!(
                "Invalid LOTSIZE_DEFAULT_PIP_VALUE: {} (must be > 0)",
                default_pip_value
            )));
        }

        let step = Self::load_decimal(lookup, "LOTSIZE_DEFAULT_LOT_STEP", dec!(0.01))?;
        let default_lot_step = LotStep::new(step)
            .map_err(|e| DaemonError::Config(format!("Invalid LOTSIZE_DEFAULT_LOT_STEP: {}", e)))?;

        let step_rounding = match lookup("LOTSIZE_STEP_ROUNDING") {
            Some(val) => StepRounding::from_str(&val)
                .map_err(|e| DaemonError::Config(format!("Invalid LOTSIZE_STEP_ROUNDING: {}", e)))?,
            None => StepRounding::default(),
        };

        Ok(EngineConfig {
            default_pip_value,
            default_lot_step,
            step_rounding,
            pip_table_path: lookup("LOTSIZE_PIP_TABLE").map(PathBuf::from),
            volatility_table_path: lookup("LOTSIZE_VOLATILITY_TABLE").map(PathBuf::from),
        })
    }

    fn load_decimal<F>(lookup: &F, key: &str, default: Decimal) -> DaemonResult<Decimal>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(key) {
            Some(val) => Decimal::from_str(val.trim())
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            None => Ok(default),
        }
    }
}

impl EngineConfig {
    /// Calculator settings derived from this configuration
    pub fn calculator_config(&self) -> CalculatorConfig {
        CalculatorConfig {
            default_pip_value: self.default_pip_value,
            default_lot_step: self.default_lot_step,
            step_rounding: self.step_rounding,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_pip_value: dec!(10),
            default_lot_step: LotStep::DEFAULT,
            step_rounding: StepRounding::InverseFactor,
            pip_table_path: None,
            volatility_table_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5003,
            },
            engine: EngineConfig::default(),
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
