// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Forecasts are cached per symbol in
// `AppState`; `POST .../refresh` recomputes and replaces the cached report.
//
// Model fitting and CSV loading run on tokio's blocking pool so request
// handling never stalls the runtime.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::app_state::AppState;
use crate::ensemble::{run_all, EnsembleReport};
use crate::error::ForecastError;
use crate::indicators::IndicatorSnapshot;
use crate::market_data::{list_symbols, load_symbol};
use crate::models::YearlyProjection;
use crate::types::ProjectionMode;

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/forecast/:symbol", get(forecast))
        .route("/api/v1/forecast/:symbol/refresh", post(refresh_forecast))
        .route("/api/v1/prices/:symbol", get(prices))
        .route("/api/v1/indicators/:symbol", get(indicators))
        .route("/api/v1/projection/:symbol", get(projection))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

fn status_for(err: &ForecastError) -> StatusCode {
    match err {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        ForecastError::InsufficientData { .. }
        | ForecastError::StaleFeatures { .. }
        | ForecastError::Singular(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ForecastError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ForecastError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

/// Run `work` on the blocking pool and map its error.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(api_error),
        Err(e) => {
            error!(error = %e, "blocking task failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal task failure" })),
            ))
        }
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    uptime_secs: u64,
    cached_forecasts: usize,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        uptime_secs: state.uptime_secs(),
        cached_forecasts: state.cached_count(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Symbols
// =============================================================================

#[derive(Serialize, Deserialize)]
struct SymbolsResponse {
    symbols: Vec<String>,
}

async fn symbols(State(state): State<Arc<AppState>>) -> ApiResult<SymbolsResponse> {
    let dir = state.config.read().data_dir.clone();
    let symbols = blocking(move || list_symbols(dir)).await?;
    Ok(Json(SymbolsResponse { symbols }))
}

// =============================================================================
// Forecasts
// =============================================================================

async fn compute_forecast(state: &AppState, symbol: String) -> Result<EnsembleReport, ApiError> {
    let config = state.config_snapshot();
    let report = blocking(move || {
        let table = load_symbol(&config.data_dir, &symbol)?;
        Ok(run_all(&table, &config))
    })
    .await?;
    state.store_forecast(report.clone());
    Ok(report)
}

async fn forecast(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<EnsembleReport> {
    if let Some(cached) = state.cached_forecast(&symbol) {
        return Ok(Json(cached));
    }
    info!(symbol = %symbol, "forecast cache miss");
    compute_forecast(&state, symbol).await.map(Json)
}

async fn refresh_forecast(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<EnsembleReport> {
    info!(symbol = %symbol, "forecast refresh requested");
    compute_forecast(&state, symbol).await.map(Json)
}

// =============================================================================
// Price history
// =============================================================================

#[derive(Debug, Deserialize)]
struct PricesQuery {
    /// Return only the newest `limit` closes.
    limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct PricePoint {
    date: NaiveDate,
    close: f64,
}

#[derive(Serialize, Deserialize)]
struct PriceHistory {
    symbol: String,
    total: usize,
    points: Vec<PricePoint>,
}

async fn prices(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<PricesQuery>,
) -> ApiResult<PriceHistory> {
    let dir = state.config.read().data_dir.clone();
    let history = blocking(move || {
        let table = load_symbol(&dir, &symbol)?;
        if table.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        let bars = table.bars();
        let skip = query
            .limit
            .map_or(0, |limit| bars.len().saturating_sub(limit));
        Ok(PriceHistory {
            symbol: table.symbol.clone(),
            total: bars.len(),
            points: bars[skip..]
                .iter()
                .map(|b| PricePoint {
                    date: b.date,
                    close: b.close,
                })
                .collect(),
        })
    })
    .await?;
    Ok(Json(history))
}

// =============================================================================
// Indicators
// =============================================================================

async fn indicators(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<IndicatorSnapshot> {
    let config = state.config_snapshot();
    let snapshot = blocking(move || {
        let table = load_symbol(&config.data_dir, &symbol)?;
        IndicatorSnapshot::latest(&table, &config.indicators).ok_or(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        })
    })
    .await?;
    Ok(Json(snapshot))
}

// =============================================================================
// Long-range projection
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProjectionQuery {
    #[serde(default)]
    mode: ProjectionMode,
}

async fn projection(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ProjectionQuery>,
) -> ApiResult<YearlyProjection> {
    let config = state.config_snapshot();
    let projection = blocking(move || {
        let table = load_symbol(&config.data_dir, &symbol)?;
        YearlyProjection::run(&table, &config.multiple, query.mode)
    })
    .await?;
    Ok(Json(projection))
}
