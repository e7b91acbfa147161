// =============================================================================
// Rolling-window statistics — SMA and rolling volatility
// =============================================================================
//
// Both functions return a series aligned with the input: element `i` covers
// the window ending at `i`, and the first `window - 1` positions are `None`
// (the window is not yet full).
//
//   SMA_i = mean(x[i-w+1 ..= i])
//   σ_i   = sqrt( Σ (x - SMA_i)² / (w - 1) )        (sample std, n-1)
// =============================================================================

/// Simple moving average over `window` values.
///
/// `window == 0` yields an all-`None` series. A window containing a non-finite
/// value yields `None` at that position.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for end in window - 1..values.len() {
        let slice = &values[end + 1 - window..=end];
        let mean = slice.iter().sum::<f64>() / window as f64;
        if mean.is_finite() {
            out[end] = Some(mean);
        }
    }
    out
}

/// Rolling sample standard deviation (n - 1 denominator).
///
/// Requires `window >= 2`; smaller windows yield an all-`None` series.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window < 2 || values.len() < window {
        return out;
    }

    for end in window - 1..values.len() {
        let slice = &values[end + 1 - window..=end];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        let std = var.sqrt();
        if std.is_finite() {
            out[end] = Some(std);
        }
    }
    out
}

/// Last defined value of an aligned series.
pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warm_up_and_values() {
        let sma = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(sma.len(), 5);
        assert!(sma[0].is_none() && sma[1].is_none());
        assert!((sma[2].unwrap() - 2.0).abs() < 1e-10);
        assert!((sma[4].unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn sma_degenerate_windows() {
        assert!(rolling_mean(&[1.0, 2.0], 0).iter().all(Option::is_none));
        assert!(rolling_mean(&[1.0, 2.0], 3).iter().all(Option::is_none));
        assert!(rolling_mean(&[], 3).is_empty());
    }

    #[test]
    fn sma_nan_window_is_undefined() {
        let sma = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(sma[1].is_none());
        assert!(sma[2].is_none());
        assert!((sma[3].unwrap() - 3.5).abs() < 1e-10);
    }

    #[test]
    fn std_uses_sample_denominator() {
        // [2, 4, 4, 4, 5, 5, 7, 9]: population σ = 2, sample σ = sqrt(32/7)
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = rolling_std(&data, 8);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((std[7].unwrap() - expected).abs() < 1e-10);
        assert!(std[6].is_none());
    }

    #[test]
    fn std_flat_series_is_zero() {
        let std = rolling_std(&[5.0; 10], 4);
        assert!(std[3..].iter().all(|v| v.unwrap().abs() < 1e-12));
    }

    #[test]
    fn std_window_one_is_undefined() {
        assert!(rolling_std(&[1.0, 2.0, 3.0], 1).iter().all(Option::is_none));
    }

    #[test]
    fn last_defined_skips_trailing_none() {
        assert_eq!(last_defined(&[None, Some(1.0), Some(2.0), None]), Some(2.0));
        assert_eq!(last_defined(&[None, None]), None);
    }
}
