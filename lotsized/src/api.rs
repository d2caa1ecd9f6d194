//! HTTP API for the lotsize daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Lot size calculation
//! - Risk assessment of a calculated position
//! - Known pairs and their pip values
//!
//! Every endpoint accepts cross-origin requests from any origin.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use lotsize_domain::LooseRiskInputs;
use lotsize_engine::{Assessment, Calculation, RiskAssessor, RiskCalculator, RiskLevel};

use crate::error::DaemonError;

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Lot size calculator with its pip-value source
    pub calculator: RiskCalculator,
    /// Scores calculated positions
    pub assessor: RiskAssessor,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the server answers
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Lot size calculation response.
///
/// Money at risk is rounded to 4 decimal places, lots and the position pip
/// value to 5. Everything else is echoed unrounded.
#[derive(Debug, Serialize)]
pub struct CalcResponse {
    /// Normalized balance
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Normalized risk percent
    #[serde(with = "rust_decimal::serde::float")]
    pub risk_percent: Decimal,
    /// balance × risk_percent / 100, 4 dp
    #[serde(with = "rust_decimal::serde::float")]
    pub money_risk: Decimal,
    /// Normalized stop-loss distance in pips
    #[serde(with = "rust_decimal::serde::float")]
    pub stop_loss: Decimal,
    /// Uppercased pair, possibly empty
    pub pair: String,
    /// Pip value used for the calculation
    #[serde(with = "rust_decimal::serde::float")]
    pub pip_value_per_lot: Decimal,
    /// Lot step in effect
    #[serde(with = "rust_decimal::serde::float")]
    pub lot_step: Decimal,
    /// Largest lot within the risk budget, 5 dp
    #[serde(with = "rust_decimal::serde::float")]
    pub recommended_lot: Decimal,
    /// Pip value at the recommended lot, 5 dp
    #[serde(with = "rust_decimal::serde::float")]
    pub pip_value_position: Decimal,
}

impl From<&Calculation> for CalcResponse {
    fn from(calc: &Calculation) -> Self {
        Self {
            balance: calc.balance,
            risk_percent: calc.risk_percent,
            money_risk: calc.money_risk.round_dp(4),
            stop_loss: calc.stop_loss,
            pair: calc.pair.to_string(),
            pip_value_per_lot: calc.pip_value_per_lot,
            lot_step: calc.lot_step.as_decimal(),
            recommended_lot: calc.recommended_lot.round_dp(5),
            pip_value_position: calc.pip_value_position.round_dp(5),
        }
    }
}

/// Risk assessment response.
#[derive(Debug, Serialize)]
pub struct AssessResponse {
    /// Uppercased pair, possibly empty
    pub pair: String,
    /// Recommended lot, 5 dp
    #[serde(with = "rust_decimal::serde::float")]
    pub recommended_lot: Decimal,
    /// Score from 0 to 10
    pub risk_score: u8,
    /// LOW, MEDIUM or HIGH
    pub risk_level: RiskLevel,
    /// Typical daily range of the pair in pips
    #[serde(with = "rust_decimal::serde::float")]
    pub volatility: Decimal,
    /// Advice, most urgent first
    pub insights: Vec<String>,
    /// 2% of balance
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_loss_limit: Decimal,
    /// 5% of balance
    #[serde(with = "rust_decimal::serde::float")]
    pub weekly_loss_limit: Decimal,
}

impl AssessResponse {
    fn new(calc: &Calculation, assessment: Assessment) -> Self {
        Self {
            pair: calc.pair.to_string(),
            recommended_lot: calc.recommended_lot.round_dp(5),
            risk_score: assessment.score,
            risk_level: assessment.level,
            volatility: assessment.volatility,
            insights: assessment
                .insights
                .iter()
                .map(|insight| insight.message().to_string())
                .collect(),
            daily_loss_limit: assessment.daily_loss_limit.round_dp(4),
            weekly_loss_limit: assessment.weekly_loss_limit.round_dp(4),
        }
    }
}

/// One entry of the pair listing.
#[derive(Debug, Serialize)]
pub struct PairPipValue {
    /// Pair code
    pub pair: String,
    /// Pip value per standard lot
    #[serde(with = "rust_decimal::serde::float")]
    pub pip_value_per_lot: Decimal,
}

/// Known pairs response.
#[derive(Debug, Serialize)]
pub struct PairsResponse {
    /// Known pairs in alphabetical order
    pub pairs: Vec<PairPipValue>,
    /// Pip value used for unknown pairs
    #[serde(with = "rust_decimal::serde::float")]
    pub default_pip_value: Decimal,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/calc", post(calc_handler))
        .route("/api/assess", post(assess_handler))
        .route("/api/pairs", get(pairs_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Calculate the recommended lot size.
async fn calc_handler(State(state): State<Arc<ApiState>>, body: Bytes) -> ApiResult<CalcResponse> {
    let calc = calculate(&state, &body)?;
    Ok(Json(CalcResponse::from(&calc)))
}

/// Calculate, then assess the resulting position.
async fn assess_handler(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> ApiResult<AssessResponse> {
    let calc = calculate(&state, &body)?;
    let assessment = state.assessor.assess(&calc);

    Ok(Json(AssessResponse::new(&calc, assessment)))
}

/// List pairs with a known pip value.
async fn pairs_handler(State(state): State<Arc<ApiState>>) -> Json<PairsResponse> {
    let pairs = state
        .calculator
        .pip_values()
        .pairs()
        .into_iter()
        .map(|(pair, pip_value_per_lot)| PairPipValue {
            pair,
            pip_value_per_lot,
        })
        .collect();

    Json(PairsResponse {
        pairs,
        default_pip_value: state.calculator.config().default_pip_value,
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a request body leniently.
///
/// Anything that is not a JSON object (empty, malformed, an array) is
/// treated as an empty object.
pub fn parse_body(body: &[u8]) -> LooseRiskInputs {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => LooseRiskInputs::default(),
    }
}

fn calculate(
    state: &ApiState,
    body: &[u8],
) -> Result<Calculation, (StatusCode, Json<ErrorResponse>)> {
    let inputs = state.calculator.normalize(&parse_body(body));

    state.calculator.calculate(&inputs).map_err(|e| {
        info!(pair = %inputs.pair, error = %e, "Calculation rejected");
        to_error_response(e.into())
    })
}

fn to_error_response(error: DaemonError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// =============================================================================
// Tests
// =============================================================================
