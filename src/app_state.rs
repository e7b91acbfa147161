// =============================================================================
// Central Application State — forecast server
// =============================================================================
//
// Shared across all request handlers via `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the config and the forecast cache.
//   - Model fitting never runs under a lock: handlers clone the config,
//     compute on a blocking thread and only then take the write lock.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::ensemble::EnsembleReport;
use crate::market_data::normalise_symbol;
use crate::runtime_config::ForecastConfig;

pub struct AppState {
    /// Incremented every time the forecast cache changes.
    pub state_version: AtomicU64,

    pub config: Arc<RwLock<ForecastConfig>>,

    /// Latest ensemble report per normalised symbol.
    forecasts: RwLock<HashMap<String, EnsembleReport>>,

    started_at: Instant,
}

impl AppState {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            state_version: AtomicU64::new(0),
            config: Arc::new(RwLock::new(config)),
            forecasts: RwLock::new(HashMap::new()),
            started_at: Instant::now(),
        }
    }

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::Relaxed)
    }

    /// Copy of the current configuration, safe to move into a blocking task.
    pub fn config_snapshot(&self) -> ForecastConfig {
        self.config.read().clone()
    }

    pub fn cached_forecast(&self, symbol: &str) -> Option<EnsembleReport> {
        self.forecasts.read().get(&normalise_symbol(symbol)).cloned()
    }

    /// Insert or replace the cached report for its symbol.
    pub fn store_forecast(&self, report: EnsembleReport) {
        let key = normalise_symbol(&report.symbol);
        self.forecasts.write().insert(key, report);
        self.increment_version();
    }

    pub fn cached_count(&self) -> usize {
        self.forecasts.read().len()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
