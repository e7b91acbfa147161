// =============================================================================
// Min-max feature scaling
// =============================================================================
//
//   x' = (x − min) / (max − min)
//
// Fitted on training rows only; rows transformed later may fall outside
// [0, 1]. A zero-range column maps to 0.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    /// Learn per-column bounds from `rows`.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            })?;
        let mut min = vec![f64::INFINITY; width];
        let mut max = vec![f64::NEG_INFINITY; width];
        for row in rows {
            if row.len() != width {
                return Err(ForecastError::invalid("rows", "rows have different widths"));
            }
            for (j, &v) in row.iter().enumerate() {
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }
        Ok(Self { min, max })
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, &v)| {
                let range = self.max[j] - self.min[j];
                if range > 0.0 {
                    (v - self.min[j]) / range
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn width(&self) -> usize {
        self.min.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_training_rows_into_unit_range() {
        let rows = vec![vec![10.0, 1.0], vec![20.0, 3.0], vec![15.0, 2.0]];
        let scaler = MinMaxScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows);
        assert_eq!(scaled[0], vec![0.0, 0.0]);
        assert_eq!(scaled[1], vec![1.0, 1.0]);
        assert_eq!(scaled[2], vec![0.5, 0.5]);
        assert_eq!(scaler.width(), 2);
    }

    #[test]
    fn unseen_rows_may_leave_unit_range() {
        let scaler = MinMaxScaler::fit(&[vec![0.0], vec![10.0]]).unwrap();
        assert_eq!(scaler.transform_row(&[15.0]), vec![1.5]);
        assert_eq!(scaler.transform_row(&[-5.0]), vec![-0.5]);
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let scaler = MinMaxScaler::fit(&[vec![7.0], vec![7.0]]).unwrap();
        assert_eq!(scaler.transform_row(&[9.0]), vec![0.0]);
    }

    #[test]
    fn empty_fit_fails() {
        assert!(MinMaxScaler::fit(&[]).is_err());
    }
}
