//! Lotsize Daemon
//!
//! Serves the lot size calculator over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration (0.0.0.0:5003)
//! cargo run -p lotsized
//!
//! # Start with custom environment
//! LOTSIZE_ENV=production LOTSIZE_API_PORT=8081 cargo run -p lotsized
//! ```
//!
//! # Environment Variables
//!
//! - `LOTSIZE_ENV`: Environment (test, development, production)
//! - `LOTSIZE_API_HOST`: API host (default: 0.0.0.0)
//! - `LOTSIZE_API_PORT`: API port (default: 5003)
//! - `LOTSIZE_DEFAULT_PIP_VALUE`: Pip value for unknown pairs (default: 10)
//! - `LOTSIZE_DEFAULT_LOT_STEP`: Lot step when none is sent (default: 0.01)
//! - `LOTSIZE_STEP_ROUNDING`: `factor` or `exact` (default: factor)
//! - `LOTSIZE_PIP_TABLE`: Pip value JSON file (default: bundled table)
//! - `LOTSIZE_VOLATILITY_TABLE`: Volatility JSON file (default: bundled table)

use lotsized::{Config, Daemon, Environment};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("lotsized=info".parse()?)
        .add_directive("lotsize_engine=info".parse()?);

    match config.environment {
        Environment::Production => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        Environment::Test | Environment::Development => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        "Lotsize daemon"
    );

    // Create and run daemon
    let daemon = Daemon::from_config(config)?;
    daemon.run().await?;

    Ok(())
}
