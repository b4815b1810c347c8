//! Spread Monitor
//!
//! Context object created once at startup and driven tick by tick:
//!   sample prices → pairwise spread → history + CSV
//!   sample triangle legs per exchange → opportunity → CSV
//!   render chart from the history
//!
//! Collaborator failures (CSV, chart) are logged and never abort a tick.
//! Ticks run back to back on a fixed interval and never overlap.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

use crate::chart::ChartSink;
use crate::config::MonitorConfig;
use crate::history::SpreadHistory;
use crate::recorder::{OpportunitySink, SampleSink};
use crate::sampler::Sampler;
use crate::spread::{pairwise_spread, triangular_opportunity};
use crate::types::{PairwiseSpreadSample, TradingPair, TrianglePath, TriangularOpportunity};
use anyhow::Result;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What one tick produced
#[derive(Debug, Default)]
pub struct TickReport {
    pub sample: Option<PairwiseSpreadSample>,
    pub opportunities: Vec<TriangularOpportunity>,
}

/// Static parameters of the tick flow
#[derive(Debug, Clone)]
pub struct TickSettings {
    pub symbol: TradingPair,
    pub triangle_path: TrianglePath,
    pub triangle_start_amount: f64,
    pub poll_interval: Duration,
    pub tick_count: Option<u64>,
}

impl From<&MonitorConfig> for TickSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            symbol: config.symbol.clone(),
            triangle_path: config.triangle_path.clone(),
            triangle_start_amount: config.triangle_start_amount,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            tick_count: config.tick_count,
        }
    }
}

/// Owns everything one run needs
pub struct Monitor {
    settings: TickSettings,
    sampler: Sampler,
    history: SpreadHistory,
    sample_sink: Box<dyn SampleSink>,
    opportunity_sink: Box<dyn OpportunitySink>,
    chart: Option<Box<dyn ChartSink>>,
    ticks: u64,
}

impl Monitor {
    pub fn new(
        settings: TickSettings,
        sampler: Sampler,
        sample_sink: Box<dyn SampleSink>,
        opportunity_sink: Box<dyn OpportunitySink>,
    ) -> Self {
        Self {
            settings,
            sampler,
            history: SpreadHistory::new(),
            sample_sink,
            opportunity_sink,
            chart: None,
            ticks: 0,
        }
    }

    pub fn with_chart(mut self, chart: Box<dyn ChartSink>) -> Self {
        self.chart = Some(chart);
        self
    }

    pub fn history(&self) -> &SpreadHistory {
        &self.history
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run a single tick
    pub async fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let now = Utc::now();
        let mut report = TickReport::default();

        if let Some(sample) = self.sample_pairwise(now).await {
            log_sample(&sample);
            if let Err(e) = self.sample_sink.record_sample(&sample) {
                warn!("Failed to record spread sample: {:#}", e);
            }
            self.history.push(sample.clone());
            report.sample = Some(sample);
        }

        report.opportunities = self.check_triangles(now).await;
        for opp in &report.opportunities {
            if let Err(e) = self.opportunity_sink.record_opportunity(opp) {
                warn!("Failed to record triangular opportunity: {:#}", e);
            }
        }

        if let Some(chart) = self.chart.as_mut() {
            if let Err(e) = chart.render(self.history.samples()) {
                warn!("Chart render failed: {:#}", e);
            }
        }

        report
    }

    async fn sample_pairwise(&self, now: chrono::DateTime<Utc>) -> Option<PairwiseSpreadSample> {
        let quotes = self.sampler.sample_prices(&self.settings.symbol).await?;
        pairwise_spread(now, &quotes)
    }

    /// Every profitable exchange is reported, not just the last one checked
    async fn check_triangles(&self, now: chrono::DateTime<Utc>) -> Vec<TriangularOpportunity> {
        let path = &self.settings.triangle_path;
        let mut found = Vec::new();

        for exchange in self.sampler.triangular_exchanges() {
            let Some(quotes) = self.sampler.sample_triangle(exchange.as_ref(), path).await else {
                continue;
            };

            match triangular_opportunity(now, self.settings.triangle_start_amount, path, &quotes) {
                Some(opp) => {
                    info!(
                        "Triangular arbitrage on {}: {} | {:.4} → {:.4} | profit {:.4} ({:.4}%)",
                        opp.exchange,
                        opp.path,
                        opp.starting_amount,
                        opp.final_amount,
                        opp.profit,
                        opp.profit_percent
                    );
                    found.push(opp);
                }
                None => debug!("No triangular opportunity on {}", exchange.id()),
            }
        }

        found
    }

    /// Tick on the poll interval until the tick budget is spent or
    /// `shutdown` yields
    pub async fn run<S>(&mut self, shutdown: S) -> Result<()>
    where
        S: Stream,
    {
        let mut shutdown = Box::pin(shutdown);
        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Monitoring {} on {} every {:?} ({})",
            self.settings.symbol,
            self.sampler.exchange_ids().join(", "),
            self.settings.poll_interval,
            match self.settings.tick_count {
                Some(n) => format!("{} ticks", n),
                None => "until stopped".to_string(),
            }
        );

        loop {
            if let Some(limit) = self.settings.tick_count {
                if self.ticks >= limit {
                    info!("Tick budget of {} reached", limit);
                    break;
                }
            }

            // Shutdown wins over a ready tick
            tokio::select! {
                biased;
                _ = shutdown.next() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {}
            }

            let report = self.tick().await;
            if report.sample.is_none() {
                debug!("Tick {}: no complete sample", self.ticks);
            }
        }

        self.log_summary();
        Ok(())
    }

    /// Per-exchange spread statistics over the whole run
    pub fn log_summary(&self) {
        info!(
            "Run finished: {} ticks, {} complete samples",
            self.ticks,
            self.history.len()
        );
        for stats in self.history.summary() {
            info!(
                "  {} vs reference: n={} min={:.4}% max={:.4}% mean={:.4}%",
                stats.exchange, stats.samples, stats.min_spread, stats.max_spread, stats.mean_spread
            );
        }
    }
}

fn log_sample(sample: &PairwiseSpreadSample) {
    let prices = sample
        .prices
        .iter()
        .map(|p| format!("{}: {}", capitalize(&p.exchange), p.price))
        .collect::<Vec<_>>()
        .join(" | ");
    let spreads = sample
        .spreads
        .iter()
        .map(|s| format!("{:.2}%", s.spread_percent))
        .collect::<Vec<_>>()
        .join(", ");
    info!("{} | Spread: {}", prices, spreads);
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
