//! Lotsize Daemon Library
//!
//! HTTP service computing a recommended position size from account risk
//! parameters.
//!
//! # Architecture
//!
//! ```text
//! HTTP client → API (CORS, lenient JSON) → RiskCalculator → PipValueSource
//!                                        ↘ RiskAssessor   → VolatilityTable
//! ```
//!
//! # Components
//!
//! - **Daemon**: Loads tables, serves the API, shuts down on SIGINT
//! - **API**: `/api/calc`, `/api/assess`, `/api/pairs`, `/health`
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use lotsized::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::from_config(config).expect("Failed to load tables");
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;

// Re-exports for convenience
pub use api::{create_router, ApiState};
pub use config::{ApiConfig, Config, EngineConfig, Environment};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
