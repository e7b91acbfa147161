// =============================================================================
// Indicator configuration and latest-value snapshot
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::bollinger::{calculate_bollinger, BollingerBand};
use crate::indicators::ema::ewm_aligned;
use crate::indicators::macd::{macd, macd_signal};
use crate::indicators::rolling::{last_defined, rolling_mean, rolling_std};
use crate::indicators::rsi::current_rsi;
use crate::market_data::PriceTable;

fn default_window() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_k() -> f64 {
    2.0
}

/// Look-back parameters for the technical indicator set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_window")]
    pub sma_window: usize,
    #[serde(default = "default_window")]
    pub ema_span: usize,
    #[serde(default = "default_window")]
    pub volatility_window: usize,
    #[serde(default = "default_window")]
    pub rsi_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    /// Bollinger window; the bands sit on SMA/volatility of this length.
    #[serde(default = "default_window")]
    pub bollinger_window: usize,
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_window: default_window(),
            ema_span: default_window(),
            volatility_window: default_window(),
            rsi_period: default_window(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_window: default_window(),
            bollinger_k: default_bollinger_k(),
        }
    }
}

/// Most recent value of every indicator, for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub volatility: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_label: Option<String>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bollinger: Option<BollingerBand>,
}

impl IndicatorSnapshot {
    /// Snapshot of the last bar. `None` for an empty table.
    pub fn latest(table: &PriceTable, config: &IndicatorConfig) -> Option<Self> {
        let last = table.latest()?;
        let closes = table.closes();

        let rsi_value = current_rsi(&closes, config.rsi_period);
        let macd_line = macd(&closes, config.macd_fast, config.macd_slow);
        let signal = macd_signal(&macd_line, config.macd_signal);
        let bollinger = calculate_bollinger(&closes, config.bollinger_window, config.bollinger_k);

        Some(Self {
            symbol: table.symbol.clone(),
            date: last.date,
            close: last.close,
            sma: last_defined(&rolling_mean(&closes, config.sma_window)),
            ema: last_defined(&ewm_aligned(&closes, config.ema_span)),
            volatility: last_defined(&rolling_std(&closes, config.volatility_window)),
            rsi: rsi_value.map(|(v, _)| v),
            rsi_label: rsi_value.map(|(_, label)| label.to_string()),
            macd: last_defined(&macd_line),
            macd_signal: last_defined(&signal),
            bollinger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Bar;

    fn rising_table(n: usize) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = (0..n)
            .map(|i| Bar::close_only(start + chrono::Duration::days(i as i64), 100.0 + i as f64))
            .collect();
        PriceTable::from_bars("UP", bars)
    }

    #[test]
    fn default_config_from_empty_json() {
        let cfg: IndicatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, IndicatorConfig::default());
        assert_eq!(cfg.macd_slow, 26);
        assert!((cfg.bollinger_k - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_of_rising_series() {
        let table = rising_table(40);
        let snap = IndicatorSnapshot::latest(&table, &IndicatorConfig::default()).unwrap();
        assert_eq!(snap.close, 139.0);
        // SMA of the last 14 closes 126..=139
        assert!((snap.sma.unwrap() - 132.5).abs() < 1e-10);
        assert_eq!(snap.rsi_label.as_deref(), Some("OVERBOUGHT"));
        assert!(snap.macd.unwrap() > 0.0);
        assert!(snap.bollinger.is_some());
    }

    #[test]
    fn snapshot_short_series_has_gaps() {
        let table = rising_table(5);
        let snap = IndicatorSnapshot::latest(&table, &IndicatorConfig::default()).unwrap();
        assert!(snap.sma.is_none());
        assert!(snap.rsi.is_none());
        assert!(snap.ema.is_some());
    }

    #[test]
    fn snapshot_of_empty_table() {
        let table = PriceTable::from_bars("NONE", Vec::new());
        assert!(IndicatorSnapshot::latest(&table, &IndicatorConfig::default()).is_none());
    }
}
