// Core data structures shared by the sampler, spread math and sinks

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tradeable instrument of the form BASE/QUOTE
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
        }
    }
}

impl FromStr for TradingPair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
            bail!("Invalid trading pair '{}', expected BASE/QUOTE", s);
        }
        Ok(Self::new(parts[0], parts[1]))
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Top-of-book snapshot plus last trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
}

/// Last traded price from one exchange, valid for a single tick
#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub exchange: String,
    pub pair: TradingPair,
    pub last_price: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Bid/ask quote from one exchange, valid for a single tick
#[derive(Debug, Clone)]
pub struct TickerQuote {
    pub exchange: String,
    pub pair: TradingPair,
    pub ticker: Ticker,
    pub fetched_at: DateTime<Utc>,
}

/// Price of one exchange within a spread sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangePrice {
    pub exchange: String,
    pub price: f64,
}

/// Spread of one non-reference exchange against the reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSpread {
    pub exchange: String,
    pub spread_percent: f64,
}

/// One complete pairwise tick: every configured exchange priced.
///
/// `prices` keeps configured order with the reference exchange first.
/// `spreads` holds every non-reference exchange in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseSpreadSample {
    pub timestamp: DateTime<Utc>,
    pub reference: String,
    pub reference_price: f64,
    pub prices: Vec<ExchangePrice>,
    pub spreads: Vec<ExchangeSpread>,
}

impl PairwiseSpreadSample {
    pub fn price_of(&self, exchange: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|p| p.exchange == exchange)
            .map(|p| p.price)
    }

    pub fn spread_of(&self, exchange: &str) -> Option<f64> {
        self.spreads
            .iter()
            .find(|s| s.exchange == exchange)
            .map(|s| s.spread_percent)
    }
}

/// Profitable three-leg round trip on a single exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangularOpportunity {
    pub timestamp: DateTime<Utc>,
    pub exchange: String,
    pub starting_amount: f64,
    pub final_amount: f64,
    pub profit: f64,
    pub profit_percent: f64,
    pub path: String,
}

/// Currency cycle start → first → second → start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrianglePath {
    pub start: String,
    pub first: String,
    pub second: String,
}

impl TrianglePath {
    pub fn new(start: &str, first: &str, second: &str) -> Result<Self> {
        let path = Self {
            start: start.trim().to_uppercase(),
            first: first.trim().to_uppercase(),
            second: second.trim().to_uppercase(),
        };
        if path.start.is_empty() || path.first.is_empty() || path.second.is_empty() {
            bail!("Triangle path currencies must be non-empty");
        }
        if path.start == path.first || path.start == path.second || path.first == path.second {
            bail!("Triangle path currencies must be distinct: {}", path.describe());
        }
        Ok(path)
    }

    /// Leg 1: buy `first` with `start` (e.g. BTC/USDT, pay the ask)
    pub fn entry_pair(&self) -> TradingPair {
        TradingPair::new(&self.first, &self.start)
    }

    /// Leg 2: buy `second` with `first` (e.g. ETH/BTC, pay the ask)
    pub fn cross_pair(&self) -> TradingPair {
        TradingPair::new(&self.second, &self.first)
    }

    /// Leg 3: sell `second` for `start` (e.g. ETH/USDT, hit the bid)
    pub fn exit_pair(&self) -> TradingPair {
        TradingPair::new(&self.second, &self.start)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} → {} → {} → {}",
            self.start, self.first, self.second, self.start
        )
    }
}

impl Default for TrianglePath {
    fn default() -> Self {
        Self {
            start: "USDT".to_string(),
            first: "BTC".to_string(),
            second: "ETH".to_string(),
        }
    }
}

/// Tickers for the three legs of a triangle on one exchange
#[derive(Debug, Clone)]
pub struct TriangleQuotes {
    pub exchange: String,
    pub entry: Ticker,
    pub cross: Ticker,
    pub exit: Ticker,
}
