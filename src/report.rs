// =============================================================================
// Terminal report rendering
// =============================================================================
//
// Plain-text tables for the CLI. Every renderer returns a `String` so the
// output can be checked in tests and printed in one go.

use std::fmt::Write;

use crate::ensemble::{EnsembleReport, ModelStatus};
use crate::indicators::IndicatorSnapshot;
use crate::models::YearlyProjection;

fn opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

/// Summary table, consensus line and next-days table.
pub fn render_ensemble(report: &EnsembleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", report.symbol);
    if let (Some(date), Some(close)) = (report.latest_date, report.latest_close) {
        let _ = writeln!(out, "Latest close {date}: {close:.2}");
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<22} {:>12} {:>12} {:>10} {:>10} {:>8}",
        "Model", "Target date", "Prediction", "MAE", "RMSE", "Eval"
    );

    for row in &report.rows {
        match &row.status {
            ModelStatus::Ok => {
                let target = row.target_date.map(|d| d.to_string()).unwrap_or_default();
                let (mae, rmse, eval) = match &row.metrics {
                    Some(m) => (
                        format!("{:.4}", m.mae),
                        format!("{:.4}", m.rmse),
                        match m.evaluated_on {
                            crate::models::EvalSet::Training => "train",
                            crate::models::EvalSet::HoldOut => "holdout",
                        },
                    ),
                    None => ("-".into(), "-".into(), "-"),
                };
                let _ = writeln!(
                    out,
                    "{:<22} {:>12} {:>12} {:>10} {:>10} {:>8}",
                    row.model.to_string(),
                    target,
                    opt(row.prediction),
                    mae,
                    rmse,
                    eval
                );
            }
            ModelStatus::Error(message) => {
                let _ = writeln!(out, "{:<22} Error: {message}", row.model.to_string());
            }
        }
    }

    let _ = writeln!(out);
    match report.consensus {
        Some(consensus) => {
            let change = report
                .consensus_change_pct()
                .map(|pct| format!(" ({pct:+.2}%)"))
                .unwrap_or_default();
            let _ = writeln!(out, "Consensus: {consensus:.2}{change}");
        }
        None => {
            let _ = writeln!(out, "Consensus: unavailable (every model failed)");
        }
    }

    if let Some(first) = report.next_days.first() {
        let _ = writeln!(out);
        let _ = write!(out, "{:<12}", "Date");
        for column in &report.next_days {
            let _ = write!(out, " {:>22}", column.model.to_string());
        }
        let _ = writeln!(out);
        for (i, point) in first.points.iter().enumerate() {
            let _ = write!(out, "{:<12}", point.date.to_string());
            for column in &report.next_days {
                let value = column.points.get(i).map(|p| p.close);
                let _ = write!(out, " {:>22}", opt(value));
            }
            let _ = writeln!(out);
        }
    }
    out
}

pub fn render_indicators(snapshot: &IndicatorSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} @ {} ===", snapshot.symbol, snapshot.date);
    let _ = writeln!(out, "{:<16} {:>12.2}", "Close", snapshot.close);
    let _ = writeln!(out, "{:<16} {:>12}", "SMA", opt(snapshot.sma));
    let _ = writeln!(out, "{:<16} {:>12}", "EMA", opt(snapshot.ema));
    let _ = writeln!(out, "{:<16} {:>12}", "Volatility", opt(snapshot.volatility));
    let label = snapshot.rsi_label.as_deref().unwrap_or("");
    let _ = writeln!(out, "{:<16} {:>12} {label}", "RSI", opt(snapshot.rsi));
    let _ = writeln!(out, "{:<16} {:>12}", "MACD", opt(snapshot.macd));
    let _ = writeln!(out, "{:<16} {:>12}", "MACD signal", opt(snapshot.macd_signal));
    if let Some(band) = &snapshot.bollinger {
        let _ = writeln!(out, "{:<16} {:>12.2}", "Bollinger upper", band.upper);
        let _ = writeln!(out, "{:<16} {:>12.2}", "Bollinger lower", band.lower);
        let _ = writeln!(out, "{:<16} {:>12}", "Band width %", opt(band.percent_width()));
    }
    out
}

pub fn render_projection(projection: &YearlyProjection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== {} yearly projection ({}) ===",
        projection.symbol, projection.mode
    );
    let _ = writeln!(out, "{:<8} {:>12} {:>12}", "Year", "Close", "Fitted");
    for row in &projection.history {
        let _ = writeln!(
            out,
            "{:<8} {:>12.2} {:>12.2}",
            row.year, row.year_end_close, row.fitted_close
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{:<8} {:>12}", "Year", "Projected");
    for point in &projection.future {
        let _ = writeln!(out, "{:<8.2} {:>12.2}", point.year, point.predicted_close);
    }

    let m = &projection.metrics;
    let _ = writeln!(out);
    let _ = writeln!(out, "MAE: {:.4}", m.mae);
    let _ = writeln!(out, "MSE: {:.4}", m.mse);
    let _ = writeln!(out, "RMSE: {:.4}", m.rmse);
    let _ = writeln!(out, "Adjusted R2: {}", opt(m.adjusted_r2));
    let _ = writeln!(out, "Huber loss: {}", opt(m.huber));
    if let Some(last) = projection.final_point() {
        let _ = writeln!(
            out,
            "Predicted close for {:.2}: {:.2}",
            last.year, last.predicted_close
        );
    }
    out
}
