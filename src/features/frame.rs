// =============================================================================
// Feature frame and look-ahead targets
// =============================================================================
//
// `FeatureFrame::build` evaluates every column over the closes and keeps only
// the rows where all columns are defined (drop-NA). Each kept row remembers
// which bar it came from so the look-ahead target can be read off the raw
// close series:
//
//   target_i = close[bar_index_i + horizon]
//
// Rows whose target bar does not exist yet are "pending": they are exactly the
// inputs a model needs to forecast the next `horizon` closes.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::features::column::FeatureColumn;
use crate::market_data::PriceTable;

/// One fully-defined feature row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    /// Index of the source bar in the price table.
    pub bar_index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub columns: Vec<FeatureColumn>,
    pub rows: Vec<FeatureRow>,
    closes: Vec<f64>,
}

/// A feature row paired with its look-ahead target close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledRow {
    pub row: FeatureRow,
    pub target: f64,
}

/// Feature rows split by whether their look-ahead target is known.
#[derive(Debug, Clone)]
pub struct LabelledFrame {
    pub horizon: usize,
    pub labelled: Vec<LabelledRow>,
    pub pending: Vec<FeatureRow>,
}

impl FeatureFrame {
    /// Evaluate `columns` over the table and drop incomplete rows.
    pub fn build(table: &PriceTable, columns: &[FeatureColumn]) -> Result<Self> {
        if columns.is_empty() {
            return Err(ForecastError::invalid("columns", "at least one feature column is required"));
        }

        let closes = table.closes();
        let series: Vec<Vec<Option<f64>>> = columns.iter().map(|c| c.compute(&closes)).collect();

        let rows: Vec<FeatureRow> = table
            .bars()
            .iter()
            .enumerate()
            .filter_map(|(i, bar)| {
                let values = series
                    .iter()
                    .map(|s| s[i])
                    .collect::<Option<Vec<f64>>>()?;
                Some(FeatureRow {
                    bar_index: i,
                    date: bar.date,
                    close: bar.close,
                    values,
                })
            })
            .collect();

        if rows.is_empty() {
            let required = columns.iter().map(FeatureColumn::warm_up).max().unwrap_or(0) + 1;
            return Err(ForecastError::InsufficientData {
                required,
                actual: table.len(),
            });
        }

        debug!(
            symbol = %table.symbol,
            bars = table.len(),
            rows = rows.len(),
            columns = columns.len(),
            "feature frame built"
        );

        Ok(Self {
            columns: columns.to_vec(),
            rows,
            closes,
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(FeatureColumn::name).collect()
    }

    /// Attach the close `horizon` bars ahead to every row where it exists.
    pub fn with_lookahead_target(&self, horizon: usize) -> Result<LabelledFrame> {
        if horizon == 0 {
            return Err(ForecastError::invalid("horizon", "must be at least 1"));
        }

        let mut labelled = Vec::with_capacity(self.rows.len());
        let mut pending = Vec::new();
        for row in &self.rows {
            match self.closes.get(row.bar_index + horizon) {
                Some(&target) => labelled.push(LabelledRow {
                    row: row.clone(),
                    target,
                }),
                None => pending.push(row.clone()),
            }
        }

        Ok(LabelledFrame {
            horizon,
            labelled,
            pending,
        })
    }
}

impl LabelledFrame {
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.labelled.iter().map(|l| l.row.values.clone()).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.labelled.iter().map(|l| l.target).collect()
    }

    pub fn pending_features(&self) -> Vec<Vec<f64>> {
        self.pending.iter().map(|r| r.values.clone()).collect()
    }

    /// Fail unless at least `required` labelled rows are available.
    pub fn require_labelled(&self, required: usize) -> Result<()> {
        if self.labelled.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: self.labelled.len(),
            });
        }
        Ok(())
    }
}
