// =============================================================================
// Exponential Weighted Mean (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula (recursive form, span parameterisation):
//   alpha = 2 / (span + 1)
//   EMA_0 = close_0
//   EMA_t = close_t * alpha + EMA_{t-1} * (1 - alpha)
//
// The series is seeded with the first close, so every position is defined and
// the output is aligned with the input.
// =============================================================================

/// Compute the EMA series for the given `values` and `span`.
///
/// # Edge cases
/// - `span == 0` => empty vec
/// - Non-finite input poisons the recursion; from that point on the output
///   stays `NaN`, and callers treat it as undefined.
pub fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || values.is_empty() {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev = values[0];
    result.push(prev);

    for &value in &values[1..] {
        prev = value * alpha + prev * (1.0 - alpha);
        result.push(prev);
    }
    result
}

/// EMA series as an aligned `Option` series (non-finite => `None`).
pub fn ewm_aligned(values: &[f64], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    ewm(values, span)
        .into_iter()
        .map(|v| v.is_finite().then_some(v))
        .collect()
}
