// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), with σ the rolling sample standard deviation
// over the same window.
//
// The residual band width is `upper - lower = 2kσ`; the percentage width
// normalises it by the middle band.

use serde::{Deserialize, Serialize};

use crate::indicators::rolling::{rolling_mean, rolling_std};

/// One Bollinger Band observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBand {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBand {
    /// Residual width `upper - lower`.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Width as a percentage of the middle band. `None` when the middle band
    /// is zero.
    pub fn percent_width(&self) -> Option<f64> {
        if self.middle == 0.0 {
            return None;
        }
        let pct = self.width() / self.middle * 100.0;
        pct.is_finite().then_some(pct)
    }
}

/// Bollinger Bands aligned with `closes`; the first `window - 1` positions
/// are `None`.
pub fn bollinger_bands(closes: &[f64], window: usize, num_std: f64) -> Vec<Option<BollingerBand>> {
    let sma = rolling_mean(closes, window);
    let std = rolling_std(closes, window);

    sma.into_iter()
        .zip(std)
        .map(|(middle, sigma)| {
            let (middle, sigma) = (middle?, sigma?);
            Some(BollingerBand {
                upper: middle + num_std * sigma,
                middle,
                lower: middle - num_std * sigma,
            })
        })
        .collect()
}

/// Bands for the most recent full window only.
///
/// Returns `None` with fewer than `window` closes.
pub fn calculate_bollinger(closes: &[f64], window: usize, num_std: f64) -> Option<BollingerBand> {
    if window < 2 || closes.len() < window {
        return None;
    }
    let tail = &closes[closes.len() - window..];
    *bollinger_bands(tail, window, num_std).last()?
}
