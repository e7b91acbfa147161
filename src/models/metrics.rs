// =============================================================================
// Forecast accuracy metrics
// =============================================================================
//
// All functions return NaN for empty or mismatched inputs, except the
// `Option`-returning ones where the statistic is undefined.

use serde::{Deserialize, Serialize};

/// Mean Absolute Error
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Mean Squared Error
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}

/// Root Mean Squared Error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Coefficient of determination. `None` when the actuals have no variance.
pub fn r2(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return None;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot < 1e-12 {
        return None;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Some(1.0 - ss_res / ss_tot)
}

/// Adjusted R² for `n` observations and `k` regressors.
///
/// `None` when `n <= k + 1` (no residual degrees of freedom).
pub fn adjusted_r2(r2: f64, n: usize, k: usize) -> Option<f64> {
    if n <= k + 1 {
        return None;
    }
    Some(1.0 - (1.0 - r2) * (n as f64 - 1.0) / (n - k - 1) as f64)
}

/// Mean Huber loss: quadratic inside `delta`, linear outside.
pub fn huber_loss(actual: &[f64], predicted: &[f64], delta: f64) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let err = (a - p).abs();
            if err <= delta {
                0.5 * err * err
            } else {
                delta * (err - 0.5 * delta)
            }
        })
        .sum();
    sum / actual.len() as f64
}

/// Which rows the metrics were computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalSet {
    /// In-sample: the rows the model was fitted on.
    Training,
    /// Out-of-sample: a chronological hold-out at the end of the history.
    HoldOut,
}

/// Error summary attached to every forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_r2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub huber: Option<f64>,
    pub evaluated_on: EvalSet,
    /// Number of rows the metrics cover.
    pub samples: usize,
}

impl Metrics {
    /// MAE / MSE / RMSE / R² over the given rows.
    pub fn evaluate(actual: &[f64], predicted: &[f64], evaluated_on: EvalSet) -> Self {
        let mse = mse(actual, predicted);
        Self {
            mae: mae(actual, predicted),
            mse,
            rmse: mse.sqrt(),
            r2: r2(actual, predicted),
            adjusted_r2: None,
            huber: None,
            evaluated_on,
            samples: actual.len(),
        }
    }

    /// Add adjusted R² (for `regressors` features) and Huber loss.
    pub fn with_regression_extras(mut self, actual: &[f64], predicted: &[f64], regressors: usize) -> Self {
        self.adjusted_r2 = self
            .r2
            .and_then(|r2| adjusted_r2(r2, actual.len(), regressors));
        self.huber = Some(huber_loss(actual, predicted, 1.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_errors() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.5, 2.0, 2.0, 4.0];
        assert!((mae(&actual, &predicted) - 0.375).abs() < 1e-12);
        assert!((mse(&actual, &predicted) - 0.3125).abs() < 1e-12);
        assert!((rmse(&actual, &predicted) - 0.3125_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn mismatched_inputs_are_nan() {
        assert!(mae(&[1.0], &[1.0, 2.0]).is_nan());
        assert!(mse(&[], &[]).is_nan());
        assert!(r2(&[], &[]).is_none());
    }

    #[test]
    fn r2_perfect_and_constant() {
        assert!((r2(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!(r2(&[2.0, 2.0], &[1.0, 3.0]).is_none());
    }

    #[test]
    fn adjusted_r2_penalises_regressors() {
        let adj = adjusted_r2(0.9, 20, 3).unwrap();
        assert!((adj - (1.0 - 0.1 * 19.0 / 16.0)).abs() < 1e-12);
        assert!(adjusted_r2(0.9, 4, 3).is_none());
    }

    #[test]
    fn huber_switches_to_linear() {
        // errors 0.5 (quadratic: 0.125) and 3.0 (linear: 2.5)
        let loss = huber_loss(&[0.0, 0.0], &[0.5, 3.0], 1.0);
        assert!((loss - (0.125 + 2.5) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn evaluate_with_extras() {
        let actual = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let predicted = [1.1, 1.9, 3.2, 3.9, 5.0, 6.1];
        let m = Metrics::evaluate(&actual, &predicted, EvalSet::Training)
            .with_regression_extras(&actual, &predicted, 2);
        assert_eq!(m.samples, 6);
        assert!(m.r2.unwrap() > 0.99);
        assert!(m.adjusted_r2.unwrap() < m.r2.unwrap());
        assert!(m.huber.unwrap() < m.mse);
    }
}
