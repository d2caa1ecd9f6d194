//! Daemon error types.

use lotsize_engine::EngineError;
use thiserror::Error;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Engine error, displayed as-is so client messages stay stable
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server I/O error
    #[error("Server error: {0}")]
    Server(String),
}

impl DaemonError {
    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, DaemonError::Engine(e) if e.is_client_error())
    }
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
