// =============================================================================
// Forecasting Models
// =============================================================================
//
// Every model exposes the same train/predict contract through `Forecaster`:
// given a price table, build its features, fit on the rows whose look-ahead
// target is known, and predict the close `horizon` trading days after the
// latest bar. The rows still waiting for their target give the forecast path
// over the next `horizon` days.

pub mod gradient_boost;
pub mod linear;
pub mod metrics;
pub mod multiple;
pub mod ols;
pub mod scaler;
pub mod tree;
pub mod yearly;

pub use gradient_boost::{GradientBoostModel, GradientBoostParams};
pub use linear::{LinearParams, LinearRegressionModel};
pub use metrics::{EvalSet, Metrics};
pub use multiple::{MultipleParams, MultipleRegressionModel};
pub use yearly::YearlyProjection;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::features::{FeatureRow, LabelledFrame};
use crate::market_data::PriceTable;
use crate::types::ModelKind;

/// Common train/predict contract.
pub trait Forecaster: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Fit on `table` and forecast the close `horizon` trading days ahead.
    fn forecast(&self, table: &PriceTable) -> Result<ModelForecast>;
}

/// One point on a model's forecast path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Output of a single model run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelForecast {
    pub model: ModelKind,
    pub symbol: String,
    /// Forecast close `horizon` trading days after `latest_date`.
    pub prediction: f64,
    pub latest_date: NaiveDate,
    pub latest_close: f64,
    pub target_date: NaiveDate,
    pub horizon: usize,
    /// Forecasts for the next trading days, oldest first; the last point is
    /// `prediction`.
    pub next_days: Vec<PathPoint>,
    pub metrics: Metrics,
    pub features: Vec<String>,
}

/// Forecast path for the pending rows of `labelled`, given per-row
/// predictions in the same order.
pub(crate) fn forecast_path(
    table: &PriceTable,
    labelled: &LabelledFrame,
    predictions: &[f64],
) -> Result<Vec<PathPoint>> {
    let latest = table.latest().ok_or(ForecastError::InsufficientData {
        required: 1,
        actual: 0,
    })?;
    let last_index = table.len() - 1;

    if let Some(last_row) = labelled.pending.last() {
        if last_row.bar_index != last_index {
            return Err(ForecastError::StaleFeatures {
                latest: latest.date,
                last_row: last_row.date,
            });
        }
    }

    let path: Vec<PathPoint> = labelled
        .pending
        .iter()
        .zip(predictions)
        .map(|(row, &close)| PathPoint {
            date: advance_trading_days(latest.date, target_offset(row, labelled.horizon, last_index)),
            close,
        })
        .collect();

    if path.is_empty() {
        // The last `horizon` bars produced no complete feature rows.
        return Err(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    Ok(path)
}

/// Assemble a `ModelForecast` from a finished path.
pub(crate) fn assemble(
    model: ModelKind,
    table: &PriceTable,
    horizon: usize,
    next_days: Vec<PathPoint>,
    metrics: Metrics,
    features: Vec<String>,
) -> Result<ModelForecast> {
    let latest = table.latest().ok_or(ForecastError::InsufficientData {
        required: 1,
        actual: 0,
    })?;
    let last = *next_days.last().ok_or(ForecastError::InsufficientData {
        required: 1,
        actual: 0,
    })?;
    Ok(ModelForecast {
        model,
        symbol: table.symbol.clone(),
        prediction: last.close,
        latest_date: latest.date,
        latest_close: latest.close,
        target_date: last.date,
        horizon,
        next_days,
        metrics,
        features,
    })
}

/// Trading days between the last bar and the target bar of `row`.
fn target_offset(row: &FeatureRow, horizon: usize, last_index: usize) -> usize {
    (row.bar_index + horizon).saturating_sub(last_index)
}

/// Move `days` weekdays forward from `date` (weekends skipped, holidays not).
pub fn advance_trading_days(date: NaiveDate, days: usize) -> NaiveDate {
    let mut current = date;
    let mut remaining = days;
    while remaining > 0 {
        current += Duration::days(1);
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }
    current
}

/// Build the forecaster for `kind` from the engine configuration.
pub fn build(kind: ModelKind, config: &crate::runtime_config::ForecastConfig) -> Box<dyn Forecaster> {
    match kind {
        ModelKind::LinearRegression => Box::new(LinearRegressionModel::new(config.linear.clone(), config.horizon)),
        ModelKind::MultipleRegression => {
            Box::new(MultipleRegressionModel::new(config.multiple.clone(), config.horizon))
        }
        ModelKind::GradientBoost => Box::new(GradientBoostModel::new(
            config.gradient_boost.clone(),
            config.horizon,
            config.test_days,
        )),
    }
}
