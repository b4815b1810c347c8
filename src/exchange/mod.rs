//! Exchange Module
//!
//! Public REST ticker adapters for centralized exchanges.
//! Each adapter answers two questions for a trading pair:
//! the last traded price, and the current bid/ask/last ticker.
//!
//! No authentication, no retries. A failed request is reported as a
//! `FetchError` and the caller decides what "absent" means for the tick.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

pub mod binance;
pub mod coinbase;
pub mod kraken;

#[cfg(test)]
pub mod mock;

pub use binance::BinanceClient;
pub use coinbase::CoinbaseClient;
pub use kraken::KrakenClient;

use crate::types::{Ticker, TradingPair};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a single exchange query produced no usable price
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("exchange returned error: {0}")]
    Exchange(String),

    #[error("missing field '{0}' in response")]
    MissingField(&'static str),

    #[error("invalid price for {field}: '{value}'")]
    InvalidPrice { field: &'static str, value: String },

    #[error("pair {0} is not supported by this exchange")]
    UnsupportedPair(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Read-only market data capability of one exchange
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Stable lower-case identifier, used in logs and CSV columns
    fn id(&self) -> &str;

    async fn get_last_price(&self, pair: &TradingPair) -> FetchResult<f64>;

    async fn get_ticker(&self, pair: &TradingPair) -> FetchResult<Ticker>;
}

/// Exchanges with a REST adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    Binance,
    Coinbase,
    Kraken,
}

impl ExchangeKind {
    pub fn id(&self) -> &'static str {
        match self {
            ExchangeKind::Binance => "binance",
            ExchangeKind::Coinbase => "coinbase",
            ExchangeKind::Kraken => "kraken",
        }
    }
}

impl FromStr for ExchangeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(ExchangeKind::Binance),
            "coinbase" => Ok(ExchangeKind::Coinbase),
            "kraken" => Ok(ExchangeKind::Kraken),
            other => bail!(
                "Unsupported exchange: '{}'. Supported: binance, coinbase, kraken",
                other
            ),
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Build the shared HTTP client used by every adapter
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        // Coinbase rejects requests without a user agent
        .user_agent(concat!("spreadwatch/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Create the adapter for `kind` on top of a shared HTTP client
pub fn build_exchange(kind: ExchangeKind, http: reqwest::Client) -> Arc<dyn ExchangeClient> {
    match kind {
        ExchangeKind::Binance => Arc::new(BinanceClient::new(http)),
        ExchangeKind::Coinbase => Arc::new(CoinbaseClient::new(http)),
        ExchangeKind::Kraken => Arc::new(KrakenClient::new(http)),
    }
}

/// Parse a decimal price string, rejecting non-finite and non-positive values
pub(crate) fn parse_price(field: &'static str, value: &str) -> FetchResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(FetchError::InvalidPrice {
            field,
            value: value.to_string(),
        }),
    }
}

/// GET `url` and return the body, mapping non-2xx to `FetchError::Status`
pub(crate) async fn get_text(http: &reqwest::Client, url: &str) -> FetchResult<String> {
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(resp.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_kind_parse() {
        assert_eq!("Binance".parse::<ExchangeKind>().unwrap(), ExchangeKind::Binance);
        assert_eq!(" kraken ".parse::<ExchangeKind>().unwrap(), ExchangeKind::Kraken);
        assert!("bitmex".parse::<ExchangeKind>().is_err());
        assert_eq!(ExchangeKind::Coinbase.to_string(), "coinbase");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("price", "50000.12").unwrap(), 50000.12);
        assert!(matches!(
            parse_price("price", "0"),
            Err(FetchError::InvalidPrice { field: "price", .. })
        ));
        assert!(parse_price("price", "-1").is_err());
        assert!(parse_price("price", "NaN").is_err());
        assert!(parse_price("price", "abc").is_err());
    }
}
