//! Engine error types.

use lotsize_domain::DomainError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by the calculator and its reference tables.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Stop-loss distance or resolved pip value is not positive
    #[error("stop_loss and pip_value must be > 0")]
    Validation {
        /// Normalized stop-loss distance
        stop_loss: Decimal,
        /// Resolved pip value per lot
        pip_value: Decimal,
    },

    /// Intermediate value left the representable decimal range
    #[error("calculation overflow: {0}")]
    Overflow(&'static str),

    /// Pip-value table could not be loaded
    #[error("pip value table: {0}")]
    PipTable(String),

    /// Volatility table could not be loaded
    #[error("volatility table: {0}")]
    VolatilityTable(String),

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl EngineError {
    /// True for errors caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Overflow(_))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
