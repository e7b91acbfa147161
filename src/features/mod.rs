// =============================================================================
// Feature Pipeline
// =============================================================================
//
// Turns a price table into model-ready rows:
// - column definitions (indicator + parameters)
// - drop-NA frame construction
// - look-ahead target construction

pub mod column;
pub mod frame;

pub use column::FeatureColumn;
pub use frame::{FeatureFrame, FeatureRow, LabelledFrame};

use crate::indicators::IndicatorConfig;

/// The seven-column technical set used by the gradient-boosting model:
/// SMA, EMA, volatility, RSI, MACD and both Bollinger bands.
pub fn technical_set(config: &IndicatorConfig) -> Vec<FeatureColumn> {
    vec![
        FeatureColumn::Sma {
            window: config.sma_window,
        },
        FeatureColumn::Ema {
            span: config.ema_span,
        },
        FeatureColumn::Volatility {
            window: config.volatility_window,
        },
        FeatureColumn::Rsi {
            period: config.rsi_period,
        },
        FeatureColumn::Macd {
            fast: config.macd_fast,
            slow: config.macd_slow,
        },
        FeatureColumn::BollingerUpper {
            window: config.bollinger_window,
            k: config.bollinger_k,
        },
        FeatureColumn::BollingerLower {
            window: config.bollinger_window,
            k: config.bollinger_k,
        },
    ]
}

/// Trend + volatility set used by the multiple regression model.
pub fn multi_factor_set(sma_window: usize, ema_span: usize, volatility_window: usize) -> Vec<FeatureColumn> {
    vec![
        FeatureColumn::Sma { window: sma_window },
        FeatureColumn::Ema { span: ema_span },
        FeatureColumn::Volatility {
            window: volatility_window,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technical_set_names() {
        let names: Vec<String> = technical_set(&IndicatorConfig::default())
            .iter()
            .map(FeatureColumn::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "SMA_14",
                "EMA_14",
                "Volatility_14",
                "RSI_14",
                "MACD_12_26",
                "BB_upper_14",
                "BB_lower_14"
            ]
        );
    }

    #[test]
    fn multi_factor_names() {
        let names: Vec<String> = multi_factor_set(50, 20, 20).iter().map(FeatureColumn::name).collect();
        assert_eq!(names, vec!["SMA_50", "EMA_20", "Volatility_20"]);
    }
}
