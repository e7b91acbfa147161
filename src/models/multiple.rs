// =============================================================================
// Multiple Regression — trend + volatility features
// =============================================================================
//
//   close_{t+h} ≈ b₀ + b₁·SMA_50 + b₂·EMA_20 + b₃·Volatility_20
//
// Same contract as the single-feature model; the metrics additionally carry
// adjusted R² and Huber loss.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::features::{multi_factor_set, FeatureFrame};
use crate::market_data::PriceTable;
use crate::models::metrics::{EvalSet, Metrics};
use crate::models::ols::LinearFit;
use crate::models::{assemble, forecast_path, Forecaster, ModelForecast};
use crate::types::ModelKind;

fn default_sma_window() -> usize {
    50
}

fn default_ema_span() -> usize {
    20
}

fn default_volatility_window() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleParams {
    #[serde(default = "default_sma_window")]
    pub sma_window: usize,
    #[serde(default = "default_ema_span")]
    pub ema_span: usize,
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,
}

impl Default for MultipleParams {
    fn default() -> Self {
        Self {
            sma_window: default_sma_window(),
            ema_span: default_ema_span(),
            volatility_window: default_volatility_window(),
        }
    }
}

pub struct MultipleRegressionModel {
    params: MultipleParams,
    horizon: usize,
}

impl MultipleRegressionModel {
    pub fn new(params: MultipleParams, horizon: usize) -> Self {
        Self { params, horizon }
    }
}

impl Forecaster for MultipleRegressionModel {
    fn kind(&self) -> ModelKind {
        ModelKind::MultipleRegression
    }

    fn forecast(&self, table: &PriceTable) -> Result<ModelForecast> {
        let columns = multi_factor_set(
            self.params.sma_window,
            self.params.ema_span,
            self.params.volatility_window,
        );
        let frame = FeatureFrame::build(table, &columns)?;
        let labelled = frame.with_lookahead_target(self.horizon)?;
        labelled.require_labelled(columns.len() + 2)?;

        let x = labelled.features();
        let y = labelled.targets();
        let fit = LinearFit::fit(&x, &y)?;
        debug!(
            symbol = %table.symbol,
            rows = x.len(),
            coefficients = ?fit.coefficients,
            "multiple regression fitted"
        );

        let fitted = fit.predict_many(&x);
        let metrics = Metrics::evaluate(&y, &fitted, EvalSet::Training)
            .with_regression_extras(&y, &fitted, columns.len());

        let path = forecast_path(table, &labelled, &fit.predict_many(&labelled.pending_features()))?;
        assemble(self.kind(), table, self.horizon, path, metrics, frame.column_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;
    use crate::models::test_support::trending_table;

    #[test]
    fn forecasts_with_three_features() {
        let table = trending_table("MULTI", 300);
        let forecast = MultipleRegressionModel::new(MultipleParams::default(), 7)
            .forecast(&table)
            .unwrap();

        assert_eq!(forecast.model, ModelKind::MultipleRegression);
        assert_eq!(forecast.features, vec!["SMA_50", "EMA_20", "Volatility_20"]);
        assert_eq!(forecast.next_days.len(), 7);
        let m = &forecast.metrics;
        assert!(m.adjusted_r2.is_some());
        assert!(m.huber.is_some());
        assert!(m.r2.unwrap() > 0.8);
        assert!(forecast.prediction > 150.0 && forecast.prediction < 200.0);
    }

    #[test]
    fn fits_at_least_as_well_as_single_feature() {
        use crate::models::linear::{LinearParams, LinearRegressionModel};

        let table = trending_table("CMP", 300);
        let single = LinearRegressionModel::new(LinearParams::default(), 7)
            .forecast(&table)
            .unwrap();
        let multi = MultipleRegressionModel::new(MultipleParams::default(), 7)
            .forecast(&table)
            .unwrap();
        // Same rows (SMA_50 has the longest warm-up), nested feature sets.
        assert_eq!(single.metrics.samples, multi.metrics.samples);
        assert!(multi.metrics.mse <= single.metrics.mse + 1e-9);
    }

    #[test]
    fn short_history_is_insufficient() {
        let table = trending_table("SHORT", 30);
        let err = MultipleRegressionModel::new(MultipleParams::default(), 7)
            .forecast(&table)
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }
}
