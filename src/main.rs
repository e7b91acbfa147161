// =============================================================================
// Stock Predictor — Main Entry Point
// =============================================================================
//
// Command-line front end over the forecasting engine. Every command loads
// `forecast_config.json` (or `--config`), applies `.env` / environment
// overrides and then either prints a report or starts the REST API.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod ensemble;
mod error;
mod features;
mod indicators;
mod market_data;
mod models;
mod report;
mod runtime_config;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::ensemble::{run_all, EnsembleReport};
use crate::indicators::IndicatorSnapshot;
use crate::market_data::{checked_symbol, list_symbols, load_symbol};
use crate::models::YearlyProjection;
use crate::runtime_config::{ForecastConfig, DEFAULT_CONFIG_PATH};
use crate::types::ProjectionMode;

#[derive(Parser)]
#[command(name = "stock-predictor")]
#[command(about = "Technical-indicator stock forecasting", long_about = None)]
struct Cli {
    /// Path of the JSON configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory of cleaned price CSVs (overrides config and environment)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the symbols available in the data directory
    List,

    /// Show the latest technical indicators for a symbol
    Indicators {
        symbol: String,
    },

    /// Run every enabled model and print the ensemble report
    Predict {
        /// Symbols to forecast
        symbols: Vec<String>,

        /// Forecast every symbol in the data directory
        #[arg(long, conflicts_with = "symbols")]
        all: bool,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Long-range projection from yearly aggregates
    Project {
        symbol: String,

        #[arg(short, long, value_enum, default_value = "yearly")]
        mode: ProjectionMode,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Start the REST API server
    Serve {
        /// Address to bind (defaults to the configured bind_addr)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::InitConfig { force } = cli.command {
        return init_config(&cli.config, force);
    }

    // ── 2. Configuration ─────────────────────────────────────────────────
    let mut config = ForecastConfig::load_or_default(&cli.config);
    config.apply_env_overrides();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    config.validate().context("invalid forecast configuration")?;

    // ── 3. Dispatch ──────────────────────────────────────────────────────
    match cli.command {
        Commands::List => {
            let symbols = list_symbols(&config.data_dir)
                .with_context(|| format!("failed to list {}", config.data_dir.display()))?;
            if symbols.is_empty() {
                warn!(dir = %config.data_dir.display(), "no price files found");
            }
            for symbol in symbols {
                println!("{symbol}");
            }
        }
        Commands::Indicators { symbol } => {
            let table = load_symbol(&config.data_dir, &symbol)?;
            let snapshot = IndicatorSnapshot::latest(&table, &config.indicators)
                .with_context(|| format!("{} has no price rows", table.symbol))?;
            print!("{}", report::render_indicators(&snapshot));
        }
        Commands::Predict { symbols, all, json } => {
            let symbols = if all {
                list_symbols(&config.data_dir)?
            } else {
                symbols
                    .iter()
                    .map(|s| checked_symbol(s))
                    .collect::<Result<Vec<_>, _>>()?
            };
            if symbols.is_empty() {
                bail!("no symbols given (pass SYMBOL... or --all)");
            }
            predict(symbols, config, json).await?;
        }
        Commands::Project { symbol, mode, json } => {
            let table = load_symbol(&config.data_dir, &symbol)?;
            let projection = YearlyProjection::run(&table, &config.multiple, mode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projection)?);
            } else {
                print!("{}", report::render_projection(&projection));
            }
        }
        Commands::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            serve(config, &bind_addr).await?;
        }
        Commands::InitConfig { force } => init_config(&cli.config, force)?,
    }

    Ok(())
}

fn init_config(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ForecastConfig::default().save(path)?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Forecast each symbol on the blocking pool, concurrently, and print the
/// reports in the order the symbols were given.
async fn predict(symbols: Vec<String>, config: ForecastConfig, json: bool) -> anyhow::Result<()> {
    let config = Arc::new(config);
    info!(count = symbols.len(), models = ?config.models, "forecasting");

    let handles: Vec<_> = symbols
        .into_iter()
        .map(|symbol| {
            let config = config.clone();
            let sym = symbol.clone();
            let handle = tokio::task::spawn_blocking(move || {
                load_symbol(&config.data_dir, &sym).map(|table| run_all(&table, &config))
            });
            (symbol, handle)
        })
        .collect();

    let mut reports: Vec<EnsembleReport> = Vec::new();
    let mut failed = 0usize;
    for (symbol, handle) in handles {
        match handle.await {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                error!(symbol = %symbol, error = %e, "forecast failed");
                failed += 1;
            }
            Err(e) => {
                error!(symbol = %symbol, error = %e, "forecast task panicked");
                failed += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for r in &reports {
            println!("{}", report::render_ensemble(r));
        }
    }

    if reports.is_empty() && failed > 0 {
        bail!("every forecast failed");
    }
    Ok(())
}

async fn serve(config: ForecastConfig, bind_addr: &str) -> anyhow::Result<()> {
    info!(
        data_dir = %config.data_dir.display(),
        models = ?config.models,
        "starting forecast server"
    );
    let state = Arc::new(AppState::new(config));
    let app = api::rest::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("forecast server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    warn!("Shutdown signal received — stopping gracefully");
}
