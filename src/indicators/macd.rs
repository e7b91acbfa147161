// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD   = EMA(fast) - EMA(slow)           (default 12 / 26)
//   Signal = EMA(MACD, signal_span)          (default 9)
//   Hist   = MACD - Signal
//
// EMAs are seeded with the first close, so MACD is defined from index 0.

use crate::indicators::ema::ewm;

/// MACD line aligned with `closes`.
///
/// Returns an all-`None` series when either span is zero or `fast >= slow`.
pub fn macd(closes: &[f64], fast: usize, slow: usize) -> Vec<Option<f64>> {
    if fast == 0 || slow == 0 || fast >= slow {
        return vec![None; closes.len()];
    }

    let fast_ema = ewm(closes, fast);
    let slow_ema = ewm(closes, slow);
    fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| {
            let v = f - s;
            v.is_finite().then_some(v)
        })
        .collect()
}

/// Signal line: EMA of the defined part of the MACD line, re-aligned.
pub fn macd_signal(macd_line: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; macd_line.len()];
    let Some(start) = macd_line.iter().position(Option::is_some) else {
        return out;
    };

    let defined: Vec<f64> = macd_line[start..]
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    for (offset, v) in ewm(&defined, span).into_iter().enumerate() {
        if v.is_finite() {
            out[start + offset] = Some(v);
        }
    }
    out
}
