// =============================================================================
// Yearly Projection — long-range trend simulation
// =============================================================================
//
// Daily multi-factor rows are collapsed to one row per calendar year:
//
//   Avg_SMA, Avg_EMA, Avg_Volatility = yearly means,  Year_End_Close = last close
//
// A least-squares fit maps the yearly averages to the year-end close. Short
// histories (no more years than features) get the minimum-norm fit, which
// reproduces every historical year exactly. Future points are
// simulated by shrinking the latest yearly features by a fixed per-step decay
// and re-applying the fit, one step per `ProjectionMode::interval()` years.
// Metrics are in-sample over the historical years only.
// =============================================================================

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::features::{multi_factor_set, FeatureFrame};
use crate::market_data::PriceTable;
use crate::models::metrics::{EvalSet, Metrics};
use crate::models::multiple::MultipleParams;
use crate::models::ols::LinearFit;
use crate::types::ProjectionMode;

/// Per-step multiplicative decay for (SMA, EMA, volatility).
const FEATURE_DECAY: [f64; 3] = [0.995, 0.997, 0.990];

/// One aggregated historical year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: i32,
    pub avg_sma: f64,
    pub avg_ema: f64,
    pub avg_volatility: f64,
    pub year_end_close: f64,
    /// In-sample prediction for the year-end close.
    pub fitted_close: f64,
}

impl YearlyRow {
    fn features(&self) -> Vec<f64> {
        vec![self.avg_sma, self.avg_ema, self.avg_volatility]
    }
}

/// One simulated future step. `year` is fractional in monthly mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyPoint {
    pub year: f64,
    pub predicted_close: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub symbol: String,
    pub mode: ProjectionMode,
    pub features: Vec<String>,
    pub fit: LinearFit,
    pub history: Vec<YearlyRow>,
    pub future: Vec<YearlyPoint>,
    pub metrics: Metrics,
}

impl YearlyProjection {
    pub fn run(table: &PriceTable, params: &MultipleParams, mode: ProjectionMode) -> Result<Self> {
        let columns = multi_factor_set(params.sma_window, params.ema_span, params.volatility_window);
        let frame = FeatureFrame::build(table, &columns)?;

        let mut history = aggregate_years(&frame);
        if history.len() < 2 {
            return Err(ForecastError::InsufficientData {
                required: 2,
                actual: history.len(),
            });
        }

        let x: Vec<Vec<f64>> = history.iter().map(YearlyRow::features).collect();
        let y: Vec<f64> = history.iter().map(|r| r.year_end_close).collect();
        let fit = LinearFit::fit_min_norm(&x, &y)?;

        let fitted = fit.predict_many(&x);
        for (row, &value) in history.iter_mut().zip(&fitted) {
            row.fitted_close = value;
        }
        let metrics = Metrics::evaluate(&y, &fitted, EvalSet::Training).with_regression_extras(
            &y,
            &fitted,
            columns.len(),
        );

        let future = simulate(&fit, &history, mode);
        debug!(
            symbol = %table.symbol,
            years = history.len(),
            steps = future.len(),
            mode = %mode,
            "yearly projection fitted"
        );

        Ok(Self {
            symbol: table.symbol.clone(),
            mode,
            features: frame.column_names(),
            fit,
            history,
            future,
            metrics,
        })
    }

    /// The furthest simulated point.
    pub fn final_point(&self) -> Option<&YearlyPoint> {
        self.future.last()
    }
}

/// Group consecutive frame rows by calendar year. Rows are date-ordered.
fn aggregate_years(frame: &FeatureFrame) -> Vec<YearlyRow> {
    let mut years: Vec<YearlyRow> = Vec::new();
    let mut count = 0usize;

    for row in &frame.rows {
        let year = row.date.year();
        match years.last_mut() {
            Some(current) if current.year == year => {
                current.avg_sma += row.values[0];
                current.avg_ema += row.values[1];
                current.avg_volatility += row.values[2];
                current.year_end_close = row.close;
                count += 1;
            }
            _ => {
                if let Some(done) = years.last_mut() {
                    finish_year(done, count);
                }
                years.push(YearlyRow {
                    year,
                    avg_sma: row.values[0],
                    avg_ema: row.values[1],
                    avg_volatility: row.values[2],
                    year_end_close: row.close,
                    fitted_close: f64::NAN,
                });
                count = 1;
            }
        }
    }
    if let Some(done) = years.last_mut() {
        finish_year(done, count);
    }
    years
}

fn finish_year(row: &mut YearlyRow, count: usize) {
    let n = count.max(1) as f64;
    row.avg_sma /= n;
    row.avg_ema /= n;
    row.avg_volatility /= n;
}

fn simulate(fit: &LinearFit, history: &[YearlyRow], mode: ProjectionMode) -> Vec<YearlyPoint> {
    let Some(latest) = history.last() else {
        return Vec::new();
    };
    let mut features = latest.features();

    (1..=mode.steps())
        .map(|step| {
            let point = YearlyPoint {
                year: latest.year as f64 + step as f64 * mode.interval(),
                predicted_close: fit.predict(&features),
            };
            for (value, decay) in features.iter_mut().zip(FEATURE_DECAY) {
                *value *= decay;
            }
            point
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Bar, PriceTable};
    use crate::models::advance_trading_days;
    use chrono::NaiveDate;

    /// Weekday bars with curvature and a slow cycle, so the yearly averages
    /// are not collinear. 1560 bars cover six calendar years.
    fn multi_year_table(n: usize) -> PriceTable {
        table_from(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(), n)
    }

    fn table_from(start: NaiveDate, n: usize) -> PriceTable {
        let bars = (0..n)
            .map(|i| {
                let t = i as f64;
                let close = 50.0 + 0.05 * t + 0.0001 * t * t + 5.0 * (t / 40.0).sin();
                Bar::close_only(advance_trading_days(start, i), close)
            })
            .collect();
        PriceTable::from_bars("YEAR", bars)
    }

    #[test]
    fn aggregates_one_row_per_year() {
        let table = multi_year_table(1560);
        let projection = YearlyProjection::run(&table, &MultipleParams::default(), ProjectionMode::Yearly).unwrap();

        let years: Vec<i32> = projection.history.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2018, 2019, 2020, 2021, 2022, 2023]);
        // Year-end close is the last bar of that year.
        let last_bar = table.latest().unwrap();
        assert_eq!(projection.history.last().unwrap().year_end_close, last_bar.close);
        assert!(projection.history.iter().all(|r| r.fitted_close.is_finite()));
    }

    #[test]
    fn projection_steps_follow_mode() {
        let table = multi_year_table(1560);
        let params = MultipleParams::default();

        let yearly = YearlyProjection::run(&table, &params, ProjectionMode::Yearly).unwrap();
        assert_eq!(yearly.future.len(), 10);
        assert!((yearly.future[0].year - 2024.0).abs() < 1e-9);
        assert!((yearly.final_point().unwrap().year - 2033.0).abs() < 1e-9);

        let monthly = YearlyProjection::run(&table, &params, ProjectionMode::Monthly).unwrap();
        assert_eq!(monthly.future.len(), 12);
        assert!((monthly.future[0].year - (2023.0 + 1.0 / 12.0)).abs() < 1e-9);
        assert!((monthly.final_point().unwrap().year - 2024.0).abs() < 1e-9);

        let decadely = YearlyProjection::run(&table, &params, ProjectionMode::Decadely).unwrap();
        assert_eq!(decadely.future.len(), 100);
    }

    #[test]
    fn first_step_uses_latest_features_undecayed() {
        let table = multi_year_table(1560);
        let projection = YearlyProjection::run(&table, &MultipleParams::default(), ProjectionMode::Yearly).unwrap();
        let latest = projection.history.last().unwrap();
        let expected = projection.fit.predict(&latest.features());
        assert!((projection.future[0].predicted_close - expected).abs() < 1e-9);

        let decayed: Vec<f64> = latest
            .features()
            .iter()
            .zip(FEATURE_DECAY)
            .map(|(v, d)| v * d)
            .collect();
        assert!((projection.future[1].predicted_close - projection.fit.predict(&decayed)).abs() < 1e-9);
    }

    #[test]
    fn reports_regression_metrics() {
        let table = multi_year_table(1560);
        let projection = YearlyProjection::run(&table, &MultipleParams::default(), ProjectionMode::Yearly).unwrap();
        let m = &projection.metrics;
        assert_eq!(m.samples, 6);
        assert_eq!(m.evaluated_on, EvalSet::Training);
        assert!(m.mae.is_finite());
        assert!(m.huber.is_some());
        assert!(m.adjusted_r2.is_some());
    }

    #[test]
    fn three_calendar_years_project() {
        // Mid-2022 to mid-2024, the span of a two-year download.
        let table = table_from(NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(), 520);
        let projection = YearlyProjection::run(&table, &MultipleParams::default(), ProjectionMode::Yearly).unwrap();

        let years: Vec<i32> = projection.history.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2022, 2023, 2024]);
        for row in &projection.history {
            assert!((row.fitted_close - row.year_end_close).abs() < 1e-6);
        }
        assert_eq!(projection.future.len(), 10);
        assert!(projection.future.iter().all(|p| p.predicted_close.is_finite()));
        assert!(projection.metrics.adjusted_r2.is_none());
    }

    #[test]
    fn two_calendar_years_project() {
        let table = table_from(NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(), 300);
        let projection = YearlyProjection::run(&table, &MultipleParams::default(), ProjectionMode::Monthly).unwrap();

        assert_eq!(projection.history.len(), 2);
        assert!(projection.metrics.mae < 1e-6);
        assert_eq!(projection.future.len(), 12);
        assert!((projection.future[0].year - (2023.0 + 1.0 / 12.0)).abs() < 1e-9);
    }

    #[test]
    fn single_year_is_insufficient() {
        let table = multi_year_table(200);
        let err = YearlyProjection::run(&table, &MultipleParams::default(), ProjectionMode::Yearly).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { required: 2, actual: 1 }));
    }
}
