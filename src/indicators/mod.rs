// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the technical indicators used by
// the feature pipeline. Series are aligned with their input: `None` marks the
// warm-up of a rolling window or an undefined value, so callers are forced to
// handle insufficient data explicitly.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;
pub mod snapshot;

pub use bollinger::bollinger_bands;
pub use ema::ewm_aligned;
pub use macd::macd;
pub use rolling::{rolling_mean, rolling_std};
pub use rsi::rsi;
pub use snapshot::{IndicatorConfig, IndicatorSnapshot};
