//! Daemon: Main runtime orchestrator.
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Load pip-value and volatility tables
//! 3. Build calculator and assessor
//! 4. Start API server
//! 5. Graceful shutdown on SIGINT

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use lotsize_engine::{PipValueTable, RiskAssessor, RiskCalculator, VolatilityTable};

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The lotsize daemon.
pub struct Daemon {
    /// Configuration
    config: Config,
    /// State shared with API handlers
    state: Arc<ApiState>,
}

impl Daemon {
    /// Create a daemon, loading reference tables named in the configuration.
    ///
    /// Bundled tables are used for any path left unset.
    pub fn from_config(config: Config) -> DaemonResult<Self> {
        let pip_table = match &config.engine.pip_table_path {
            Some(path) => PipValueTable::from_path(path)?,
            None => PipValueTable::bundled()?,
        };
        info!(
            pairs = pip_table.len(),
            source = %config
                .engine
                .pip_table_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "bundled".to_string()),
            "Pip value table loaded"
        );

        let volatility = match &config.engine.volatility_table_path {
            Some(path) => VolatilityTable::from_path(path)?,
            None => VolatilityTable::bundled()?,
        };
        info!(pairs = volatility.len(), "Volatility table loaded");

        let calculator =
            RiskCalculator::new(Arc::new(pip_table), config.engine.calculator_config());
        let assessor = RiskAssessor::new(Arc::new(volatility));

        Ok(Self::new(config, calculator, assessor))
    }

    /// Create a daemon with provided components.
    pub fn new(config: Config, calculator: RiskCalculator, assessor: RiskAssessor) -> Self {
        Self {
            config,
            state: Arc::new(ApiState {
                calculator,
                assessor,
            }),
        }
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            default_pip_value = %self.config.engine.default_pip_value,
            default_lot_step = %self.config.engine.default_lot_step,
            step_rounding = %self.config.engine.step_rounding,
            "Starting lotsize daemon"
        );

        let listener = self.bind().await?;
        let api_addr = local_addr(&listener)?;
        info!(%api_addr, "API server started");

        axum::serve(listener, create_router(self.state.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        info!("Shutdown complete");
        Ok(())
    }

    /// Start the API server in the background and return its address.
    pub async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let listener = self.bind().await?;
        let addr = local_addr(&listener)?;
        let router = create_router(self.state.clone());

        // Spawn the server task
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "API server error");
            }
        });

        Ok(addr)
    }

    async fn bind(&self) -> DaemonResult<TcpListener> {
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        TcpListener::bind(&addr)
            .await
            .map_err(|e| DaemonError::Config(format!("Failed to bind to {}: {}", addr, e)))
    }
}

fn local_addr(listener: &TcpListener) -> DaemonResult<SocketAddr> {
    listener
        .local_addr()
        .map_err(|e| DaemonError::Server(format!("Failed to get local address: {}", e)))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
