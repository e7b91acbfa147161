// =============================================================================
// Price table — one symbol's daily history loaded from a cleaned CSV
// =============================================================================
//
// Cleaned files carry the flattened multi-index header written by the
// download step: `Date,Close_AAPL,High_AAPL,...`. Rows with an unparseable
// date or close are skipped; the table is kept sorted by date.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, Result};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One daily OHLCV row. Only the close is mandatory; the other fields are
/// carried through when the file provides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Bar {
    /// Close-only bar, used by tests and synthetic series.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// Daily price history for a single symbol.
///
/// Bars are strictly ascending by date with no duplicate dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    pub symbol: String,
    bars: Vec<Bar>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl PriceTable {
    /// Build a table from in-memory bars. Non-finite closes are dropped, the
    /// rest sorted by date and de-duplicated (first occurrence wins).
    pub fn from_bars(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        let symbol = symbol.into();
        let before = bars.len();
        let bars = normalise(bars);
        if bars.len() != before {
            debug!(symbol = %symbol, dropped = before - bars.len(), "dropped invalid or duplicate bars");
        }
        Self { symbol, bars }
    }

    /// Load a cleaned price CSV. The symbol is the upper-cased file stem.
    ///
    /// The close column is resolved as `Close_{SYMBOL}`, then any `Close*`
    /// column mentioning the symbol, then a bare `Close`.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ForecastError::FileNotFound(path.to_path_buf()));
        }

        let symbol = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_default();

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        let names: Vec<&str> = headers.iter().collect();

        let missing = |column: &str| ForecastError::ColumnMissing {
            column: column.to_string(),
            path: path.to_path_buf(),
        };

        let date_idx = names
            .iter()
            .position(|h| h.eq_ignore_ascii_case("date"))
            .ok_or_else(|| missing("Date"))?;
        let close_idx =
            resolve_column(&names, "Close", &symbol).ok_or_else(|| missing(&format!("Close_{symbol}")))?;
        let open_idx = resolve_column(&names, "Open", &symbol);
        let high_idx = resolve_column(&names, "High", &symbol);
        let low_idx = resolve_column(&names, "Low", &symbol);
        let volume_idx = resolve_column(&names, "Volume", &symbol);

        let mut bars = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record?;
            let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).and_then(parse_number);

            let date = record.get(date_idx).and_then(parse_date);
            let close = field(Some(close_idx));
            match (date, close) {
                (Some(date), Some(close)) => bars.push(Bar {
                    date,
                    open: field(open_idx),
                    high: field(high_idx),
                    low: field(low_idx),
                    close,
                    volume: field(volume_idx),
                }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(symbol = %symbol, skipped, "skipped rows with unparseable date or close");
        }

        let table = Self::from_bars(symbol, bars);
        debug!(symbol = %table.symbol, bars = table.len(), path = %path.display(), "price table loaded");
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl PriceTable {
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalise(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.retain(|b| b.close.is_finite());
    // Stable sort keeps file order among equal dates, so dedup keeps the first.
    bars.sort_by_key(|b| b.date);
    let mut seen = HashSet::with_capacity(bars.len());
    bars.retain(|b| seen.insert(b.date));
    bars
}

/// Find the column for `field` (e.g. "Close") given the file's symbol.
pub(crate) fn resolve_column(headers: &[&str], field: &str, symbol: &str) -> Option<usize> {
    let exact = format!("{field}_{symbol}");
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(&exact))
        .or_else(|| {
            let upper_symbol = symbol.to_uppercase();
            headers.iter().position(|h| {
                !symbol.is_empty()
                    && h.starts_with(field)
                    && h.to_uppercase().contains(&upper_symbol)
            })
        })
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(field)))
}

/// Accepts `YYYY-MM-DD` with an optional time / zone suffix.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_flattened_yfinance_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "AAPL.csv",
            "Date,Close_AAPL,High_AAPL,Low_AAPL,Open_AAPL,Volume_AAPL\n\
             2024-01-02,185.6,188.4,183.9,187.1,82488700\n\
             2024-01-03,184.2,185.9,183.4,184.2,58414500\n",
        );

        let table = PriceTable::load_csv(&path).unwrap();
        assert_eq!(table.symbol, "AAPL");
        assert_eq!(table.len(), 2);
        let first = &table.bars()[0];
        assert_eq!(first.date, d(2024, 1, 2));
        assert!((first.close - 185.6).abs() < 1e-10);
        assert_eq!(first.high, Some(188.4));
        assert_eq!(first.volume, Some(82_488_700.0));
    }

    #[test]
    fn falls_back_to_plain_close_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "msft.csv", "Date,Close\n2024-01-02,370.8\n");
        let table = PriceTable::load_csv(&path).unwrap();
        assert_eq!(table.symbol, "MSFT");
        assert_eq!(table.closes(), vec![370.8]);
    }

    #[test]
    fn sorts_dedups_and_drops_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "TSLA.csv",
            "Date,Close_TSLA\n\
             2024-01-04,3.0\n\
             2024-01-02 00:00:00-05:00,1.0\n\
             not-a-date,9.0\n\
             2024-01-03,\n\
             2024-01-02,7.0\n\
             2024-01-05,nan\n\
             2024-01-03,2.0\n",
        );

        let table = PriceTable::load_csv(&path).unwrap();
        assert_eq!(table.dates(), vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]);
        // The first 2024-01-02 row in file order wins.
        assert_eq!(table.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = PriceTable::load_csv("/definitely/not/here/XYZ.csv").unwrap_err();
        assert!(matches!(err, ForecastError::FileNotFound(_)));
    }

    #[test]
    fn missing_close_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "NVDA.csv", "Date,Open_NVDA\n2024-01-02,480.0\n");
        let err = PriceTable::load_csv(&path).unwrap_err();
        match err {
            ForecastError::ColumnMissing { column, .. } => assert_eq!(column, "Close_NVDA"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolve_prefers_exact_symbol_column() {
        let headers = ["Date", "Close", "Close_AMD", "Close_AMZN"];
        assert_eq!(resolve_column(&headers, "Close", "AMZN"), Some(3));
        assert_eq!(resolve_column(&headers, "Close", "INTC"), Some(1));
        assert_eq!(resolve_column(&headers, "Volume", "AMZN"), None);
    }

    #[test]
    fn from_bars_normalises() {
        let table = PriceTable::from_bars(
            "X",
            vec![
                Bar::close_only(d(2024, 1, 3), 2.0),
                Bar::close_only(d(2024, 1, 2), f64::NAN),
                Bar::close_only(d(2024, 1, 1), 1.0),
            ],
        );
        assert_eq!(table.closes(), vec![1.0, 2.0]);
        assert_eq!(table.latest().map(|b| b.date), Some(d(2024, 1, 3)));
    }
}
