//! CEX Spread Monitor Library
//!
//! Polls public exchange tickers, computes pairwise spreads against a
//! reference exchange and a triangular round-trip profit, appends them to
//! CSV files and draws a live terminal chart.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

pub mod chart;
pub mod config;
pub mod exchange;
pub mod history;
pub mod monitor;
pub mod recorder;
pub mod sampler;
pub mod spread;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, load_config_from_file, MonitorConfig};
pub use history::SpreadHistory;
pub use monitor::{Monitor, TickReport, TickSettings};
pub use sampler::Sampler;
pub use types::{PairwiseSpreadSample, PriceQuote, Ticker, TradingPair, TriangularOpportunity};
