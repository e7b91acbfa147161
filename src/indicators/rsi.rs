// =============================================================================
// Relative Strength Index (RSI) — simple rolling averages
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Split each delta into a gain (positive part) and a loss (magnitude
//          of the negative part).
// Step 3 — Average gains and losses over a rolling window of `period` deltas
//          (plain arithmetic mean, no Wilder smoothing).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

/// Compute the RSI series aligned with `closes`.
///
/// Position `i` uses the `period` deltas ending at `i`, so the first defined
/// value is at index `period`.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - No losses in the window (only gains) => 100.0
/// - No movement at all in the window => `None` (RS is 0/0)
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    // deltas[j] is the change from closes[j] to closes[j + 1].
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for end in period..closes.len() {
        let window = &deltas[end - period..end];
        let (sum_gain, sum_loss) = window.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });
        out[end] = rsi_from_averages(sum_gain / period as f64, sum_loss / period as f64);
    }
    out
}

/// Human-readable zone for an RSI value.
pub fn rsi_label(value: f64) -> &'static str {
    if value >= 70.0 {
        "OVERBOUGHT"
    } else if value <= 30.0 {
        "OVERSOLD"
    } else {
        "NEUTRAL"
    }
}

/// Return the most recent defined RSI value together with its label.
pub fn current_rsi(closes: &[f64], period: usize) -> Option<(f64, &'static str)> {
    let value = rsi(closes, period).into_iter().rev().find_map(|v| v)?;
    Some((value, rsi_label(value)))
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        return None; // No movement at all.
    }

    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}
