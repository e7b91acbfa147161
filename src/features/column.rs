// =============================================================================
// Feature columns
// =============================================================================
//
// A feature column names one indicator with its parameters and knows how to
// compute its aligned series from the closing prices.

use serde::{Deserialize, Serialize};

use crate::indicators::{bollinger_bands, ewm_aligned, macd, rolling_mean, rolling_std, rsi};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureColumn {
    Sma { window: usize },
    Ema { span: usize },
    Volatility { window: usize },
    Rsi { period: usize },
    Macd { fast: usize, slow: usize },
    BollingerUpper { window: usize, k: f64 },
    BollingerLower { window: usize, k: f64 },
}

impl FeatureColumn {
    /// Stable column name, e.g. `SMA_50` or `MACD_12_26`.
    pub fn name(&self) -> String {
        match self {
            Self::Sma { window } => format!("SMA_{window}"),
            Self::Ema { span } => format!("EMA_{span}"),
            Self::Volatility { window } => format!("Volatility_{window}"),
            Self::Rsi { period } => format!("RSI_{period}"),
            Self::Macd { fast, slow } => format!("MACD_{fast}_{slow}"),
            Self::BollingerUpper { window, .. } => format!("BB_upper_{window}"),
            Self::BollingerLower { window, .. } => format!("BB_lower_{window}"),
        }
    }

    /// Number of leading rows this column leaves undefined.
    pub fn warm_up(&self) -> usize {
        match self {
            Self::Sma { window } | Self::Volatility { window } => window.saturating_sub(1),
            Self::BollingerUpper { window, .. } | Self::BollingerLower { window, .. } => {
                window.saturating_sub(1)
            }
            Self::Rsi { period } => *period,
            Self::Ema { .. } | Self::Macd { .. } => 0,
        }
    }

    /// Aligned series for this column.
    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        match *self {
            Self::Sma { window } => rolling_mean(closes, window),
            Self::Ema { span } => ewm_aligned(closes, span),
            Self::Volatility { window } => rolling_std(closes, window),
            Self::Rsi { period } => rsi(closes, period),
            Self::Macd { fast, slow } => macd(closes, fast, slow),
            Self::BollingerUpper { window, k } => bollinger_bands(closes, window, k)
                .into_iter()
                .map(|b| b.map(|b| b.upper))
                .collect(),
            Self::BollingerLower { window, k } => bollinger_bands(closes, window, k)
                .into_iter()
                .map(|b| b.map(|b| b.lower))
                .collect(),
        }
    }
}

impl std::fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names() {
        assert_eq!(FeatureColumn::Sma { window: 50 }.name(), "SMA_50");
        assert_eq!(FeatureColumn::Macd { fast: 12, slow: 26 }.name(), "MACD_12_26");
        assert_eq!(
            FeatureColumn::BollingerLower { window: 14, k: 2.0 }.to_string(),
            "BB_lower_14"
        );
    }

    #[test]
    fn warm_up_matches_first_defined_index() {
        let closes: Vec<f64> = (0..40).map(|i| 10.0 + (i as f64 * 0.7).sin()).collect();
        let columns = [
            FeatureColumn::Sma { window: 10 },
            FeatureColumn::Volatility { window: 10 },
            FeatureColumn::Rsi { period: 14 },
            FeatureColumn::Ema { span: 14 },
            FeatureColumn::BollingerUpper { window: 10, k: 2.0 },
        ];
        for column in columns {
            let series = column.compute(&closes);
            let first = series.iter().position(Option::is_some).unwrap();
            assert_eq!(first, column.warm_up(), "{column}");
        }
    }

    #[test]
    fn bollinger_columns_bracket_sma() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + (i % 5) as f64).collect();
        let sma = FeatureColumn::Sma { window: 14 }.compute(&closes);
        let upper = FeatureColumn::BollingerUpper { window: 14, k: 2.0 }.compute(&closes);
        let lower = FeatureColumn::BollingerLower { window: 14, k: 2.0 }.compute(&closes);
        for i in 13..30 {
            assert!(upper[i].unwrap() > sma[i].unwrap());
            assert!(lower[i].unwrap() < sma[i].unwrap());
        }
    }
}
