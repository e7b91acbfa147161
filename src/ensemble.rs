// =============================================================================
// Ensemble — per-model forecasts combined into one report
// =============================================================================
//
// The consensus is the plain arithmetic mean of the successful models'
// predictions. A model that fails is still listed, with its error, so the
// report always carries one row per model that was asked to run.
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::market_data::PriceTable;
use crate::models::{self, Metrics, ModelForecast, PathPoint};
use crate::runtime_config::ForecastConfig;
use crate::types::ModelKind;

/// Outcome of one model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ModelStatus {
    Ok,
    Error(String),
}

/// One line of the summary table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub model: ModelKind,
    pub status: ModelStatus,
    pub prediction: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub metrics: Option<Metrics>,
}

/// One model's forecast path, for the next-days table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextDayColumn {
    pub model: ModelKind,
    pub points: Vec<PathPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub latest_date: Option<NaiveDate>,
    pub latest_close: Option<f64>,
    /// Mean prediction over the successful models; `None` when all failed.
    pub consensus: Option<f64>,
    pub rows: Vec<SummaryRow>,
    pub next_days: Vec<NextDayColumn>,
}

impl EnsembleReport {
    pub fn succeeded(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.status == ModelStatus::Ok)
            .count()
    }

    /// Consensus move relative to the latest close, in percent.
    pub fn consensus_change_pct(&self) -> Option<f64> {
        let consensus = self.consensus?;
        let latest = self.latest_close.filter(|c| *c != 0.0)?;
        Some((consensus - latest) / latest * 100.0)
    }
}

/// Merge per-model results, preserving their order.
pub fn combine(symbol: &str, results: Vec<(ModelKind, Result<ModelForecast>)>) -> EnsembleReport {
    let mut rows = Vec::with_capacity(results.len());
    let mut next_days = Vec::new();
    let mut predictions = Vec::new();
    let mut latest: Option<(NaiveDate, f64)> = None;

    for (kind, result) in results {
        match result {
            Ok(forecast) => {
                predictions.push(forecast.prediction);
                latest.get_or_insert((forecast.latest_date, forecast.latest_close));
                rows.push(SummaryRow {
                    model: kind,
                    status: ModelStatus::Ok,
                    prediction: Some(forecast.prediction),
                    target_date: Some(forecast.target_date),
                    metrics: Some(forecast.metrics),
                });
                next_days.push(NextDayColumn {
                    model: kind,
                    points: forecast.next_days,
                });
            }
            Err(e) => {
                warn!(symbol, model = %kind, error = %e, "model failed");
                rows.push(SummaryRow {
                    model: kind,
                    status: ModelStatus::Error(e.to_string()),
                    prediction: None,
                    target_date: None,
                    metrics: None,
                });
            }
        }
    }

    let consensus = if predictions.is_empty() {
        None
    } else {
        Some(predictions.iter().sum::<f64>() / predictions.len() as f64)
    };

    EnsembleReport {
        symbol: symbol.to_string(),
        generated_at: Utc::now(),
        latest_date: latest.map(|(d, _)| d),
        latest_close: latest.map(|(_, c)| c),
        consensus,
        rows,
        next_days,
    }
}

/// Run every enabled model on `table` and combine the results.
pub fn run_all(table: &PriceTable, config: &ForecastConfig) -> EnsembleReport {
    let results = config
        .models
        .iter()
        .map(|&kind| (kind, models::build(kind, config).forecast(table)))
        .collect();

    let report = combine(&table.symbol, results);
    info!(
        symbol = %report.symbol,
        models = report.rows.len(),
        succeeded = report.succeeded(),
        consensus = ?report.consensus,
        "ensemble forecast complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;
    use crate::models::test_support::trending_table;
    use crate::models::EvalSet;

    fn forecast(kind: ModelKind, prediction: f64) -> ModelForecast {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let target = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        ModelForecast {
            model: kind,
            symbol: "AAPL".into(),
            prediction,
            latest_date: date,
            latest_close: 100.0,
            target_date: target,
            horizon: 7,
            next_days: vec![PathPoint {
                date: target,
                close: prediction,
            }],
            metrics: Metrics::evaluate(&[1.0, 2.0], &[1.0, 2.5], EvalSet::Training),
            features: vec!["SMA_50".into()],
        }
    }

    #[test]
    fn consensus_is_plain_mean() {
        let report = combine(
            "AAPL",
            vec![
                (ModelKind::LinearRegression, Ok(forecast(ModelKind::LinearRegression, 100.0))),
                (ModelKind::MultipleRegression, Ok(forecast(ModelKind::MultipleRegression, 110.0))),
                (ModelKind::GradientBoost, Ok(forecast(ModelKind::GradientBoost, 120.0))),
            ],
        );
        assert!((report.consensus.unwrap() - 110.0).abs() < 1e-12);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.next_days.len(), 3);
        assert!((report.consensus_change_pct().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn failed_models_are_listed_but_not_averaged() {
        let report = combine(
            "AAPL",
            vec![
                (ModelKind::LinearRegression, Ok(forecast(ModelKind::LinearRegression, 100.0))),
                (
                    ModelKind::GradientBoost,
                    Err(ForecastError::InsufficientData {
                        required: 30,
                        actual: 10,
                    }),
                ),
            ],
        );
        assert_eq!(report.rows.len(), 2);
        assert!((report.consensus.unwrap() - 100.0).abs() < 1e-12);
        assert!(matches!(report.rows[1].status, ModelStatus::Error(_)));
        assert!(report.rows[1].prediction.is_none());
        assert_eq!(report.next_days.len(), 1);
    }

    #[test]
    fn all_failed_has_no_consensus() {
        let report = combine(
            "X",
            vec![(ModelKind::LinearRegression, Err(ForecastError::Singular("flat".into())))],
        );
        assert!(report.consensus.is_none());
        assert!(report.latest_close.is_none());
        assert_eq!(report.succeeded(), 0);
    }

    #[test]
    fn status_serialises_with_message() {
        let json = serde_json::to_value(ModelStatus::Error("boom".into())).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["message"], "boom");
        let ok = serde_json::to_value(ModelStatus::Ok).unwrap();
        assert_eq!(ok["state"], "ok");
    }

    #[test]
    fn run_all_uses_enabled_models() {
        let mut config = ForecastConfig::default();
        config.models = vec![ModelKind::LinearRegression, ModelKind::MultipleRegression];
        let table = trending_table("RUN", 300);

        let report = run_all(&table, &config);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.latest_date, Some(table.latest().unwrap().date));
        let c = report.consensus.unwrap();
        assert!(c > 150.0 && c < 200.0);
    }
}
