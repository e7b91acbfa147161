// =============================================================================
// Ordinary Least Squares with intercept
// =============================================================================
//
// Solves  min_β ‖y − (b₀ + Xβ)‖²  via the normal equations on mean-centred
// features:
//
//   (Xcᵀ Xc) β = Xcᵀ yc,      b₀ = ȳ − x̄ · β
//
// Centring keeps the system well conditioned when features sit at price
// scale (SMA/EMA in the hundreds). The k×k system is solved by Gaussian
// elimination with partial pivoting; a vanishing pivot means the features
// are collinear (or constant) and the fit is rejected as singular.
//
// With no more rows than features the centred system is underdetermined.
// `fit_min_norm` then returns the minimum-norm solution
//
//   β = Aᵀ (A Aᵀ)⁻¹ yc
//
// where A holds the first n−1 centred rows (the last one is their negated
// sum), so every row is fitted exactly.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Relative pivot threshold below which the system is treated as singular.
const PIVOT_EPS: f64 = 1e-10;

/// A fitted linear model `ŷ = intercept + Σ coefficients[j] · x[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearFit {
    /// Fit on rows `x` (each of equal width) against targets `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(ForecastError::invalid(
                "y",
                format!("expected {} targets, got {}", x.len(), y.len()),
            ));
        }
        let k = x.first().map(Vec::len).unwrap_or(0);
        if k == 0 {
            return Err(ForecastError::invalid("x", "at least one feature is required"));
        }
        if x.iter().any(|row| row.len() != k) {
            return Err(ForecastError::invalid("x", "rows have different widths"));
        }
        let n = x.len();
        if n < k + 1 {
            return Err(ForecastError::InsufficientData {
                required: k + 1,
                actual: n,
            });
        }

        let nf = n as f64;
        let x_mean: Vec<f64> = (0..k)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / nf)
            .collect();
        let y_mean = y.iter().sum::<f64>() / nf;

        // Normal equations on centred data.
        let mut a = vec![vec![0.0; k]; k];
        let mut b = vec![0.0; k];
        for (row, &target) in x.iter().zip(y) {
            let yc = target - y_mean;
            for i in 0..k {
                let xi = row[i] - x_mean[i];
                b[i] += xi * yc;
                for j in i..k {
                    a[i][j] += xi * (row[j] - x_mean[j]);
                }
            }
        }
        for i in 0..k {
            for j in 0..i {
                a[i][j] = a[j][i];
            }
        }

        let coefficients = solve(a, b)?;
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::Singular("non-finite coefficients".into()));
        }

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    /// Like [`LinearFit::fit`], but accepts as few as two rows. When there
    /// are no more rows than features the minimum-norm solution is returned.
    pub fn fit_min_norm(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let k = x.first().map(Vec::len).unwrap_or(0);
        if x.len() > k {
            return Self::fit(x, y);
        }
        if x.len() != y.len() {
            return Err(ForecastError::invalid(
                "y",
                format!("expected {} targets, got {}", x.len(), y.len()),
            ));
        }
        if k == 0 {
            return Err(ForecastError::invalid("x", "at least one feature is required"));
        }
        if x.iter().any(|row| row.len() != k) {
            return Err(ForecastError::invalid("x", "rows have different widths"));
        }
        let n = x.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let nf = n as f64;
        let x_mean: Vec<f64> = (0..k)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / nf)
            .collect();
        let y_mean = y.iter().sum::<f64>() / nf;

        let m = n - 1;
        let a: Vec<Vec<f64>> = x[..m]
            .iter()
            .map(|row| row.iter().zip(&x_mean).map(|(v, mean)| v - mean).collect())
            .collect();
        let b: Vec<f64> = y[..m].iter().map(|v| v - y_mean).collect();

        // Gram matrix A Aᵀ (m×m).
        let gram: Vec<Vec<f64>> = a
            .iter()
            .map(|ri| {
                a.iter()
                    .map(|rj| ri.iter().zip(rj).map(|(p, q)| p * q).sum())
                    .collect()
            })
            .collect();
        let dual = solve(gram, b)?;

        let coefficients: Vec<f64> = (0..k)
            .map(|j| a.iter().zip(&dual).map(|(row, w)| row[j] * w).sum())
            .collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, mean)| c * mean)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::Singular("non-finite coefficients".into()));
        }

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}

/// Solve `a · x = b` in place by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let k = b.len();
    let scale = (0..k).map(|i| a[i][i].abs()).fold(0.0_f64, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return Err(ForecastError::Singular("features have no variance".into()));
    }

    for col in 0..k {
        let pivot_row = (col..k)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < PIVOT_EPS * scale {
            return Err(ForecastError::Singular(format!(
                "feature {col} is constant or collinear"
            )));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..k {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..k {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; k];
    for row in (0..k).rev() {
        let tail: f64 = (row + 1..k).map(|j| a[row][j] * x[j]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
