// =============================================================================
// Forecast Configuration — model settings with atomic save
// =============================================================================
//
// Every tunable of the forecasting engine lives here: where the cleaned price
// files are, how far ahead to forecast, which models take part in the
// ensemble and each model's hyper-parameters.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ForecastError;
use crate::indicators::IndicatorConfig;
use crate::models::{GradientBoostParams, LinearParams, MultipleParams};
use crate::types::ModelKind;

pub const DEFAULT_CONFIG_PATH: &str = "forecast_config.json";

const ENV_DATA_DIR: &str = "STOCK_PREDICTOR_DATA_DIR";
const ENV_BIND_ADDR: &str = "STOCK_PREDICTOR_BIND_ADDR";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/cleaned")
}

fn default_horizon() -> usize {
    7
}

fn default_test_days() -> usize {
    7
}

fn default_models() -> Vec<ModelKind> {
    ModelKind::ALL.to_vec()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

// =============================================================================
// ForecastConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    // --- Data ---------------------------------------------------------------

    /// Directory holding one `<SYMBOL>.csv` per instrument.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    // --- Forecasting --------------------------------------------------------

    /// Trading days between the latest bar and the forecast target.
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Labelled rows held out for gradient-boosting evaluation.
    #[serde(default = "default_test_days")]
    pub test_days: usize,

    /// Models that take part in the ensemble, in report order.
    #[serde(default = "default_models")]
    pub models: Vec<ModelKind>,

    // --- Model parameters ---------------------------------------------------

    #[serde(default)]
    pub linear: LinearParams,

    #[serde(default)]
    pub multiple: MultipleParams,

    #[serde(default)]
    pub gradient_boost: GradientBoostParams,

    /// Windows for the indicator snapshot (`indicators` command and API).
    #[serde(default)]
    pub indicators: IndicatorConfig,

    // --- Server -------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            horizon: default_horizon(),
            test_days: default_test_days(),
            models: default_models(),
            linear: LinearParams::default(),
            multiple: MultipleParams::default(),
            gradient_boost: GradientBoostParams::default(),
            indicators: IndicatorConfig::default(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl ForecastConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read forecast config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse forecast config from {}", path.display()))?;

        info!(
            path = %path.display(),
            data_dir = %config.data_dir.display(),
            horizon = config.horizon,
            models = ?config.models,
            "forecast config loaded"
        );

        Ok(config)
    }

    /// Load from `path`, falling back to defaults with a warning when the
    /// file is missing or unreadable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "no forecast config found, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "failed to load forecast config, using defaults");
                Self::default()
            }
        }
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise forecast config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "forecast config saved (atomic)");
        Ok(())
    }

    /// Apply `STOCK_PREDICTOR_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            info!(data_dir = %dir, "data dir overridden from environment");
            self.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR).filter(|v| !v.trim().is_empty()) {
            info!(bind_addr = %addr, "bind address overridden from environment");
            self.bind_addr = addr.trim().to_string();
        }
    }

    /// Reject settings no model can run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::invalid("horizon", "must be at least 1"));
        }
        if self.models.is_empty() {
            return Err(ForecastError::invalid("models", "at least one model must be enabled"));
        }
        if self.linear.sma_window == 0 {
            return Err(ForecastError::invalid("linear.sma_window", "must be at least 1"));
        }
        let m = &self.multiple;
        if m.sma_window == 0 || m.ema_span == 0 || m.volatility_window < 2 {
            return Err(ForecastError::invalid(
                "multiple",
                "windows must be at least 1 (volatility at least 2)",
            ));
        }
        let gb = &self.gradient_boost;
        if gb.n_estimators == 0 {
            return Err(ForecastError::invalid("gradient_boost.n_estimators", "must be at least 1"));
        }
        if gb.learning_rate.is_nan() || gb.learning_rate <= 0.0 {
            return Err(ForecastError::invalid("gradient_boost.learning_rate", "must be positive"));
        }
        if gb.indicators.macd_fast >= gb.indicators.macd_slow {
            return Err(ForecastError::invalid(
                "gradient_boost.indicators",
                "macd_fast must be below macd_slow",
            ));
        }
        Ok(())
    }
}
