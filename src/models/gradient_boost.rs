// =============================================================================
// Gradient-Boosted Regression Trees
// =============================================================================
//
// Squared-loss boosting over the seven-column technical feature set:
//
//   F₀(x)  = mean(y)
//   r_i    = y_i − F_{m−1}(x_i)
//   h_m    = RegressionTree fitted to r
//   F_m(x) = F_{m−1}(x) + η · h_m(x)
//
// Features are min-max scaled with bounds learned on the training split.
// The last `test_days` labelled rows are held out chronologically and the
// reported metrics are computed on them.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::features::{technical_set, FeatureFrame};
use crate::indicators::IndicatorConfig;
use crate::market_data::PriceTable;
use crate::models::metrics::{EvalSet, Metrics};
use crate::models::scaler::MinMaxScaler;
use crate::models::tree::{RegressionTree, TreeParams};
use crate::models::{assemble, forecast_path, Forecaster, ModelForecast};
use crate::types::ModelKind;

fn default_n_estimators() -> usize {
    200
}

fn default_learning_rate() -> f64 {
    0.05
}

fn default_max_depth() -> usize {
    5
}

fn default_lambda() -> f64 {
    1.0
}

fn default_min_samples_leaf() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostParams {
    /// Indicator windows for the feature set.
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

impl Default for GradientBoostParams {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfig::default(),
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            lambda: default_lambda(),
            min_samples_leaf: default_min_samples_leaf(),
        }
    }
}

impl GradientBoostParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            lambda: self.lambda,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

// =============================================================================
// Boosted ensemble
// =============================================================================

/// A fitted additive ensemble of regression trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &GradientBoostParams) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: x.len().min(y.len()),
            });
        }
        if params.learning_rate.is_nan() || params.learning_rate <= 0.0 {
            return Err(ForecastError::invalid("learning_rate", "must be positive"));
        }
        if params.lambda < 0.0 {
            return Err(ForecastError::invalid("lambda", "must not be negative"));
        }

        let base = y.iter().sum::<f64>() / y.len() as f64;
        let tree_params = params.tree_params();
        let mut current = vec![base; y.len()];
        let mut residuals = vec![0.0; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            for ((r, &target), &pred) in residuals.iter_mut().zip(y).zip(&current) {
                *r = target - pred;
            }
            let tree = RegressionTree::fit(x, &residuals, &tree_params);
            for (pred, row) in current.iter_mut().zip(x) {
                *pred += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            base,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

// =============================================================================
// Forecaster
// =============================================================================

pub struct GradientBoostModel {
    params: GradientBoostParams,
    horizon: usize,
    test_days: usize,
}

impl GradientBoostModel {
    pub fn new(params: GradientBoostParams, horizon: usize, test_days: usize) -> Self {
        Self {
            params,
            horizon,
            test_days,
        }
    }
}

impl Forecaster for GradientBoostModel {
    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoost
    }

    fn forecast(&self, table: &PriceTable) -> Result<ModelForecast> {
        let columns = technical_set(&self.params.indicators);
        let frame = FeatureFrame::build(table, &columns)?;
        let labelled = frame.with_lookahead_target(self.horizon)?;
        // At least two training rows on top of the hold-out.
        labelled.require_labelled(self.test_days + 2)?;

        let x = labelled.features();
        let y = labelled.targets();
        let split = x.len() - self.test_days;
        let (x_train, x_test) = x.split_at(split);
        let (y_train, y_test) = y.split_at(split);

        let scaler = MinMaxScaler::fit(x_train)?;
        let train_scaled = scaler.transform(x_train);
        let model = GradientBoostedTrees::fit(&train_scaled, y_train, &self.params)?;
        debug!(
            symbol = %table.symbol,
            train = x_train.len(),
            test = x_test.len(),
            trees = model.n_trees(),
            "gradient boosting fitted"
        );

        let metrics = if x_test.is_empty() {
            let fitted = model.predict_many(&train_scaled);
            Metrics::evaluate(y_train, &fitted, EvalSet::Training)
        } else {
            let predicted = model.predict_many(&scaler.transform(x_test));
            Metrics::evaluate(y_test, &predicted, EvalSet::HoldOut)
        };

        let pending = scaler.transform(&labelled.pending_features());
        let path = forecast_path(table, &labelled, &model.predict_many(&pending))?;
        assemble(self.kind(), table, self.horizon, path, metrics, frame.column_names())
    }
}
