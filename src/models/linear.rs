// =============================================================================
// Linear Regression — single moving-average feature
// =============================================================================
//
// Regresses the close `horizon` trading days ahead on the current SMA:
//
//   close_{t+h} ≈ b₀ + b₁ · SMA_w(t)
//
// Fitted by OLS on every row with a known target; metrics are in-sample.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::features::{FeatureColumn, FeatureFrame};
use crate::market_data::PriceTable;
use crate::models::metrics::{EvalSet, Metrics};
use crate::models::ols::LinearFit;
use crate::models::{assemble, forecast_path, Forecaster, ModelForecast};
use crate::types::ModelKind;

fn default_sma_window() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    #[serde(default = "default_sma_window")]
    pub sma_window: usize,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            sma_window: default_sma_window(),
        }
    }
}

pub struct LinearRegressionModel {
    params: LinearParams,
    horizon: usize,
}

impl LinearRegressionModel {
    pub fn new(params: LinearParams, horizon: usize) -> Self {
        Self { params, horizon }
    }
}

impl Forecaster for LinearRegressionModel {
    fn kind(&self) -> ModelKind {
        ModelKind::LinearRegression
    }

    fn forecast(&self, table: &PriceTable) -> Result<ModelForecast> {
        let columns = [FeatureColumn::Sma {
            window: self.params.sma_window,
        }];
        let frame = FeatureFrame::build(table, &columns)?;
        let labelled = frame.with_lookahead_target(self.horizon)?;
        labelled.require_labelled(2)?;

        let x = labelled.features();
        let y = labelled.targets();
        let fit = LinearFit::fit(&x, &y)?;
        debug!(
            symbol = %table.symbol,
            rows = x.len(),
            intercept = fit.intercept,
            slope = fit.coefficients[0],
            "linear regression fitted"
        );

        let fitted = fit.predict_many(&x);
        let metrics = Metrics::evaluate(&y, &fitted, EvalSet::Training);

        let path = forecast_path(table, &labelled, &fit.predict_many(&labelled.pending_features()))?;
        assemble(self.kind(), table, self.horizon, path, metrics, frame.column_names())
    }
}
