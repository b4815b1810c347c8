//! Configuration management
//!
//! Settings come from the environment (a `.env` file is loaded first) or
//! from a TOML file. Both produce the same validated `MonitorConfig`.
//!
//! Environment:
//!   EXCHANGES=binance,coinbase      first entry is the reference
//!   SYMBOL=BTC/USDT
//!   TRIANGLE_EXCHANGES=binance      empty disables the triangular check
//!   TRIANGLE_PATH=USDT,BTC,ETH
//!   TRIANGLE_START_AMOUNT=1000
//!   POLL_INTERVAL_MS=5000
//!   TICK_COUNT=10                   0 runs until SIGINT/SIGTERM
//!   FETCH_TIMEOUT_MS=5000
//!   DATA_DIR=data
//!
//! Author: AI-Generated
//! Created: 2026-10-14

use crate::exchange::ExchangeKind;
use crate::types::{TradingPair, TrianglePath};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pairwise exchanges; the first is the reference
    pub exchanges: Vec<ExchangeKind>,
    pub symbol: TradingPair,
    pub triangle_exchanges: Vec<ExchangeKind>,
    pub triangle_path: TrianglePath,
    pub triangle_start_amount: f64,
    pub poll_interval_ms: u64,
    /// `None` runs until a shutdown signal
    pub tick_count: Option<u64>,
    pub fetch_timeout_ms: u64,
    pub data_dir: PathBuf,
}

impl MonitorConfig {
    pub fn reference(&self) -> ExchangeKind {
        self.exchanges[0]
    }

    fn validate(self) -> Result<Self> {
        if self.exchanges.len() < 2 {
            bail!("At least two exchanges are required (got {})", self.exchanges.len());
        }
        for (i, ex) in self.exchanges.iter().enumerate() {
            if self.exchanges[..i].contains(ex) {
                bail!("Exchange '{}' listed twice", ex);
            }
        }
        for (i, ex) in self.triangle_exchanges.iter().enumerate() {
            if self.triangle_exchanges[..i].contains(ex) {
                bail!("Triangle exchange '{}' listed twice", ex);
            }
        }
        if !(self.triangle_start_amount.is_finite() && self.triangle_start_amount > 0.0) {
            bail!("TRIANGLE_START_AMOUNT must be positive");
        }
        if self.poll_interval_ms == 0 {
            bail!("POLL_INTERVAL_MS must be positive");
        }
        if self.fetch_timeout_ms == 0 {
            bail!("FETCH_TIMEOUT_MS must be positive");
        }
        Ok(self)
    }
}

fn parse_exchanges(list: &str) -> Result<Vec<ExchangeKind>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ExchangeKind>())
        .collect()
}

fn parse_path(list: &str) -> Result<TrianglePath> {
    let parts: Vec<&str> = list.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        bail!("Invalid triangle path '{}', expected START,FIRST,SECOND", list);
    }
    TrianglePath::new(parts[0], parts[1], parts[2])
}

fn tick_count(n: u64) -> Option<u64> {
    (n > 0).then_some(n)
}

/// Build a config from a key/value source (environment or a map in tests)
fn from_lookup<F>(get: F) -> Result<MonitorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

    let config = MonitorConfig {
        exchanges: parse_exchanges(&var("EXCHANGES", "binance,coinbase"))
            .context("Invalid EXCHANGES")?,
        symbol: var("SYMBOL", "BTC/USDT")
            .parse::<TradingPair>()
            .context("Invalid SYMBOL")?,
        triangle_exchanges: parse_exchanges(&var("TRIANGLE_EXCHANGES", "binance"))
            .context("Invalid TRIANGLE_EXCHANGES")?,
        triangle_path: parse_path(&var("TRIANGLE_PATH", "USDT,BTC,ETH"))
            .context("Invalid TRIANGLE_PATH")?,
        triangle_start_amount: var("TRIANGLE_START_AMOUNT", "1000")
            .parse::<f64>()
            .context("Invalid TRIANGLE_START_AMOUNT")?,
        poll_interval_ms: var("POLL_INTERVAL_MS", "5000")
            .parse::<u64>()
            .context("Invalid POLL_INTERVAL_MS")?,
        tick_count: tick_count(
            var("TICK_COUNT", "10")
                .parse::<u64>()
                .context("Invalid TICK_COUNT")?,
        ),
        fetch_timeout_ms: var("FETCH_TIMEOUT_MS", "5000")
            .parse::<u64>()
            .context("Invalid FETCH_TIMEOUT_MS")?,
        data_dir: PathBuf::from(var("DATA_DIR", "data")),
    };

    config.validate()
}

/// Load configuration from the environment (after reading `.env`)
pub fn load_config() -> Result<MonitorConfig> {
    dotenv::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Top-level TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub triangular: TriangularConfig,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub exchanges: Vec<String>,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_tick_count")]
    pub tick_count: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Triangular check settings
#[derive(Debug, Clone, Deserialize)]
pub struct TriangularConfig {
    #[serde(default = "default_triangle_exchanges")]
    pub exchanges: Vec<String>,
    #[serde(default = "default_triangle_path")]
    pub path: Vec<String>,
    #[serde(default = "default_start_amount")]
    pub start_amount: f64,
}

impl Default for TriangularConfig {
    fn default() -> Self {
        Self {
            exchanges: default_triangle_exchanges(),
            path: default_triangle_path(),
            start_amount: default_start_amount(),
        }
    }
}

fn default_symbol() -> String { "BTC/USDT".to_string() }
fn default_poll_interval() -> u64 { 5000 }
fn default_tick_count() -> u64 { 10 }
fn default_fetch_timeout() -> u64 { 5000 }
fn default_data_dir() -> String { "data".to_string() }
fn default_triangle_exchanges() -> Vec<String> { vec!["binance".to_string()] }
fn default_triangle_path() -> Vec<String> {
    vec!["USDT".to_string(), "BTC".to_string(), "ETH".to_string()]
}
fn default_start_amount() -> f64 { 1000.0 }

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    pub fn into_monitor_config(self) -> Result<MonitorConfig> {
        let g = self.general;
        let t = self.triangular;
        let mut values = HashMap::new();
        values.insert("EXCHANGES", g.exchanges.join(","));
        values.insert("SYMBOL", g.symbol);
        values.insert("POLL_INTERVAL_MS", g.poll_interval_ms.to_string());
        values.insert("TICK_COUNT", g.tick_count.to_string());
        values.insert("FETCH_TIMEOUT_MS", g.fetch_timeout_ms.to_string());
        values.insert("DATA_DIR", g.data_dir);
        values.insert("TRIANGLE_EXCHANGES", t.exchanges.join(","));
        values.insert("TRIANGLE_PATH", t.path.join(","));
        values.insert("TRIANGLE_START_AMOUNT", t.start_amount.to_string());
        from_lookup(|key| values.get(key).cloned())
    }
}

/// Load from a TOML file
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<MonitorConfig> {
    TomlConfig::load(path)?.into_monitor_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.exchanges, vec![ExchangeKind::Binance, ExchangeKind::Coinbase]);
        assert_eq!(config.reference(), ExchangeKind::Binance);
        assert_eq!(config.symbol.to_string(), "BTC/USDT");
        assert_eq!(config.triangle_exchanges, vec![ExchangeKind::Binance]);
        assert_eq!(config.triangle_path, TrianglePath::default());
        assert_eq!(config.triangle_start_amount, 1000.0);
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.tick_count, Some(10));
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_overrides() {
        let config = from_lookup(lookup(&[
            ("EXCHANGES", "kraken, binance ,coinbase"),
            ("SYMBOL", "eth/usdt"),
            ("TRIANGLE_EXCHANGES", ""),
            ("TICK_COUNT", "0"),
            ("POLL_INTERVAL_MS", "1000"),
        ]))
        .unwrap();
        assert_eq!(config.reference(), ExchangeKind::Kraken);
        assert_eq!(config.exchanges.len(), 3);
        assert_eq!(config.symbol, TradingPair::new("ETH", "USDT"));
        assert!(config.triangle_exchanges.is_empty());
        assert_eq!(config.tick_count, None);
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn test_validation_errors() {
        assert!(from_lookup(lookup(&[("EXCHANGES", "binance")])).is_err());
        assert!(from_lookup(lookup(&[("EXCHANGES", "binance,binance")])).is_err());
        assert!(from_lookup(lookup(&[("EXCHANGES", "binance,ftx")])).is_err());
        assert!(from_lookup(lookup(&[("SYMBOL", "BTCUSDT")])).is_err());
        assert!(from_lookup(lookup(&[("TRIANGLE_PATH", "USDT,BTC")])).is_err());
        assert!(from_lookup(lookup(&[("TRIANGLE_START_AMOUNT", "-5")])).is_err());
        assert!(from_lookup(lookup(&[("POLL_INTERVAL_MS", "0")])).is_err());
        assert!(from_lookup(lookup(&[("FETCH_TIMEOUT_MS", "soon")])).is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[general]
exchanges = ["coinbase", "kraken"]
symbol = "ETH/USDT"
poll_interval_ms = 2000
tick_count = 0
data_dir = "/tmp/spreads"

[triangular]
exchanges = ["kraken"]
path = ["USDC", "BTC", "ETH"]
start_amount = 500.0
"#;

        let config = TomlConfig::parse(toml_str).unwrap().into_monitor_config().unwrap();
        assert_eq!(config.exchanges, vec![ExchangeKind::Coinbase, ExchangeKind::Kraken]);
        assert_eq!(config.symbol.to_string(), "ETH/USDT");
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.tick_count, None);
        assert_eq!(config.fetch_timeout_ms, 5000);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/spreads"));
        assert_eq!(config.triangle_exchanges, vec![ExchangeKind::Kraken]);
        assert_eq!(config.triangle_path.describe(), "USDC → BTC → ETH → USDC");
        assert_eq!(config.triangle_start_amount, 500.0);
    }

    #[test]
    fn test_example_config_parses() {
        let config = TomlConfig::parse(include_str!("../config/spreadwatch.toml"))
            .unwrap()
            .into_monitor_config()
            .unwrap();
        assert_eq!(config.exchanges.len(), 3);
        assert_eq!(config.triangle_exchanges.len(), 2);
    }

    #[test]
    fn test_toml_triangular_section_optional() {
        let toml_str = r#"
[general]
exchanges = ["binance", "kraken"]
"#;
        let config = TomlConfig::parse(toml_str).unwrap().into_monitor_config().unwrap();
        assert_eq!(config.triangle_exchanges, vec![ExchangeKind::Binance]);
        assert_eq!(config.tick_count, Some(10));
    }
}
