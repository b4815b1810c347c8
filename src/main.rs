//! CEX Spread Monitor
//!
//! Main entry point. Polls the configured exchanges on a fixed interval,
//! logs pairwise spreads against the reference exchange and triangular
//! opportunities to CSV, and optionally draws a live terminal chart.
//!
//! Usage:
//!   cargo run --bin spreadwatch
//!   cargo run --bin spreadwatch -- --config spreadwatch.toml --chart
//!   cargo run --bin spreadwatch -- --ticks 0      (run until Ctrl-C)
//!
//! Author: AI-Generated
//! Created: 2026-10-14

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use spreadwatch::chart::TerminalChart;
use spreadwatch::config::{load_config, load_config_from_file, MonitorConfig};
use spreadwatch::exchange::{build_exchange, build_http_client, ExchangeClient, ExchangeKind};
use spreadwatch::recorder::{OpportunityCsvLogger, SpreadCsvLogger};
use spreadwatch::{Monitor, Sampler, TickSettings};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// CEX Spread Monitor: pairwise and triangular spreads
#[derive(Parser)]
#[command(name = "spreadwatch")]
struct Args {
    /// TOML config file (environment / .env is used when omitted)
    #[arg(short, long, env = "SPREADWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Number of ticks to run, 0 = until stopped (overrides config)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Directory for CSV output (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Draw a live chart in the terminal; logs go to <data_dir>/spreadwatch.log
    #[arg(long)]
    chart: bool,
}

fn init_logging(chart: bool, data_dir: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if chart {
        std::fs::create_dir_all(data_dir)?;
        let log_path = data_dir.join("spreadwatch.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {:?}", log_path))?;
        fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }
    Ok(())
}

fn build_sampler(config: &MonitorConfig) -> Result<Sampler> {
    let timeout = Duration::from_millis(config.fetch_timeout_ms);
    let http = build_http_client(timeout)?;

    let mut clients: HashMap<ExchangeKind, Arc<dyn ExchangeClient>> = HashMap::new();
    let mut client_for = |kind: ExchangeKind| {
        clients
            .entry(kind)
            .or_insert_with(|| build_exchange(kind, http.clone()))
            .clone()
    };

    let exchanges: Vec<_> = config.exchanges.iter().map(|k| client_for(*k)).collect();
    let triangular: Vec<_> = config
        .triangle_exchanges
        .iter()
        .map(|k| client_for(*k))
        .collect();

    Ok(Sampler::new(exchanges, triangular, timeout))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };
    if let Some(ticks) = args.ticks {
        config.tick_count = (ticks > 0).then_some(ticks);
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    init_logging(args.chart, &config.data_dir)?;

    info!("===========================================");
    info!("   CEX Spread Monitor");
    info!("===========================================");
    info!("Pair: {}", config.symbol);
    info!("Reference exchange: {}", config.reference());
    info!(
        "Triangle: {} on [{}], start amount {}",
        config.triangle_path.describe(),
        config
            .triangle_exchanges
            .iter()
            .map(|k| k.id())
            .collect::<Vec<_>>()
            .join(", "),
        config.triangle_start_amount
    );
    info!("Data directory: {}", config.data_dir.display());

    let sampler = build_sampler(&config)?;
    let spread_log = SpreadCsvLogger::new(&config.data_dir, &sampler.exchange_ids())?;
    let opportunity_log = OpportunityCsvLogger::new(&config.data_dir)?;
    info!(
        "Spread log: {} ({} existing rows)",
        spread_log.path().display(),
        spread_log.record_count()?
    );
    info!(
        "Triangular log: {} ({} existing rows)",
        opportunity_log.path().display(),
        opportunity_log.record_count()?
    );

    let mut monitor = Monitor::new(
        TickSettings::from(&config),
        sampler,
        Box::new(spread_log),
        Box::new(opportunity_log),
    );
    if args.chart {
        let title = format!("{} spread vs {}", config.symbol, config.reference());
        monitor = monitor.with_chart(Box::new(TerminalChart::stdout(&title)?));
    }

    let signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    let handle = signals.handle();

    let result = monitor.run(signals).await;

    handle.close();
    // Drop the chart (restores the terminal) before returning
    drop(monitor);
    result
}
