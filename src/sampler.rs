//! Price Sampler
//!
//! Queries exchanges once per tick:
//! - Last price of the monitored pair on every pairwise exchange
//! - Bid/ask tickers for the three triangle legs on each triangular exchange
//!
//! Every fetch is bounded by a timeout and returns an explicit result.
//! Failures are logged here and degrade to "absent"; they never escape a tick.
//!
//! Gating:
//! - Pairwise: all-or-nothing. One missing exchange blanks the whole tick.
//! - Triangular: one missing leg skips that exchange for the tick.
//!
//! Requests within a tick are fanned out concurrently and joined before
//! the tick continues, so ticks never overlap.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

use crate::exchange::{ExchangeClient, FetchError, FetchResult};
use crate::types::{PriceQuote, TickerQuote, TradingPair, TriangleQuotes, TrianglePath};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches quotes from the configured exchanges
pub struct Sampler {
    /// Pairwise exchanges in configured order (first = reference)
    exchanges: Vec<Arc<dyn ExchangeClient>>,
    /// Exchanges evaluated for the triangle
    triangular: Vec<Arc<dyn ExchangeClient>>,
    /// Upper bound for a single request
    fetch_timeout: Duration,
}

impl Sampler {
    pub fn new(
        exchanges: Vec<Arc<dyn ExchangeClient>>,
        triangular: Vec<Arc<dyn ExchangeClient>>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            exchanges,
            triangular,
            fetch_timeout,
        }
    }

    pub fn exchange_ids(&self) -> Vec<String> {
        self.exchanges.iter().map(|e| e.id().to_string()).collect()
    }

    pub fn triangular_exchanges(&self) -> &[Arc<dyn ExchangeClient>] {
        &self.triangular
    }

    /// Last price of `pair` on `exchange`, bounded by the fetch timeout
    pub async fn fetch_price(
        &self,
        exchange: &dyn ExchangeClient,
        pair: &TradingPair,
    ) -> FetchResult<PriceQuote> {
        let result = tokio::time::timeout(self.fetch_timeout, exchange.get_last_price(pair))
            .await
            .unwrap_or(Err(FetchError::Timeout(self.fetch_timeout)));

        match result {
            Ok(last_price) => Ok(PriceQuote {
                exchange: exchange.id().to_string(),
                pair: pair.clone(),
                last_price,
                fetched_at: Utc::now(),
            }),
            Err(e) => {
                warn!("Error fetching {} price from {}: {}", pair, exchange.id(), e);
                Err(e)
            }
        }
    }

    /// Bid/ask/last of `pair` on `exchange`, bounded by the fetch timeout
    pub async fn fetch_ticker(
        &self,
        exchange: &dyn ExchangeClient,
        pair: &TradingPair,
    ) -> FetchResult<TickerQuote> {
        let result = tokio::time::timeout(self.fetch_timeout, exchange.get_ticker(pair))
            .await
            .unwrap_or(Err(FetchError::Timeout(self.fetch_timeout)));

        match result {
            Ok(ticker) => Ok(TickerQuote {
                exchange: exchange.id().to_string(),
                pair: pair.clone(),
                ticker,
                fetched_at: Utc::now(),
            }),
            Err(e) => {
                warn!("Error fetching {} ticker from {}: {}", pair, exchange.id(), e);
                Err(e)
            }
        }
    }

    /// One quote per pairwise exchange in configured order, or `None`
    /// if any exchange failed
    pub async fn sample_prices(&self, pair: &TradingPair) -> Option<Vec<PriceQuote>> {
        let fetches = self
            .exchanges
            .iter()
            .map(|exchange| self.fetch_price(exchange.as_ref(), pair));
        let results = join_all(fetches).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            debug!(
                "Dropping {} sample: {}/{} exchanges failed",
                pair,
                failed,
                results.len()
            );
            return None;
        }

        results.into_iter().collect::<FetchResult<Vec<_>>>().ok()
    }

    /// The three leg tickers on `exchange`, or `None` if any leg failed
    pub async fn sample_triangle(
        &self,
        exchange: &dyn ExchangeClient,
        path: &TrianglePath,
    ) -> Option<TriangleQuotes> {
        let entry_pair = path.entry_pair();
        let cross_pair = path.cross_pair();
        let exit_pair = path.exit_pair();

        let (entry, cross, exit) = futures::join!(
            self.fetch_ticker(exchange, &entry_pair),
            self.fetch_ticker(exchange, &cross_pair),
            self.fetch_ticker(exchange, &exit_pair),
        );

        match (entry, cross, exit) {
            (Ok(entry), Ok(cross), Ok(exit)) => Some(TriangleQuotes {
                exchange: exchange.id().to_string(),
                entry: entry.ticker,
                cross: cross.ticker,
                exit: exit.ticker,
            }),
            _ => {
                debug!("Skipping triangle on {}: missing leg", exchange.id());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::mock::MockExchange;

    const PAIR: &str = "BTC/USDT";

    fn pair() -> TradingPair {
        PAIR.parse().unwrap()
    }

    fn sampler(exchanges: Vec<Arc<MockExchange>>) -> Sampler {
        let exchanges: Vec<Arc<dyn ExchangeClient>> = exchanges
            .into_iter()
            .map(|e| e as Arc<dyn ExchangeClient>)
            .collect();
        Sampler::new(exchanges.clone(), exchanges, Duration::from_millis(200))
    }

    fn triangle_exchange(id: &str) -> MockExchange {
        MockExchange::new(id)
            .with_ticker("BTC/USDT", 49_990.0, 50_000.0)
            .with_ticker("ETH/BTC", 0.0499, 0.05)
            .with_ticker("ETH/USDT", 2_600.0, 2_601.0)
    }

    #[tokio::test]
    async fn test_sample_prices_all_present() {
        let binance = Arc::new(MockExchange::new("binance").with_price(PAIR, 50_100.0));
        let coinbase = Arc::new(MockExchange::new("coinbase").with_price(PAIR, 50_000.0));
        let sampler = sampler(vec![binance, coinbase]);

        let quotes = sampler.sample_prices(&pair()).await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].exchange, "binance");
        assert_eq!(quotes[0].last_price, 50_100.0);
        assert_eq!(quotes[1].exchange, "coinbase");
        assert_eq!(quotes[1].pair, pair());
    }

    #[tokio::test]
    async fn test_sample_prices_all_or_nothing() {
        let binance = Arc::new(MockExchange::new("binance").with_price(PAIR, 50_100.0));
        let coinbase = Arc::new(MockExchange::new("coinbase"));
        let kraken = Arc::new(MockExchange::new("kraken").with_price(PAIR, 50_050.0));
        let sampler = sampler(vec![binance.clone(), coinbase.clone(), kraken.clone()]);

        assert!(sampler.sample_prices(&pair()).await.is_none());
        // Every exchange was still queried
        assert_eq!(binance.calls(), 1);
        assert_eq!(coinbase.calls(), 1);
        assert_eq!(kraken.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_price_timeout() {
        let slow = MockExchange::new("slow")
            .with_price(PAIR, 1.0)
            .with_delay(Duration::from_secs(5));
        let sampler = Sampler::new(Vec::new(), Vec::new(), Duration::from_millis(20));

        let result = sampler.fetch_price(&slow, &pair()).await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_slow_exchange_blanks_tick() {
        let fast = Arc::new(MockExchange::new("fast").with_price(PAIR, 1.0));
        let slow = Arc::new(
            MockExchange::new("slow")
                .with_price(PAIR, 1.0)
                .with_delay(Duration::from_secs(5)),
        );
        let exchanges: Vec<Arc<dyn ExchangeClient>> = vec![fast, slow];
        let sampler = Sampler::new(exchanges, Vec::new(), Duration::from_millis(20));

        assert!(sampler.sample_prices(&pair()).await.is_none());
    }

    #[tokio::test]
    async fn test_sample_triangle() {
        let exchange = triangle_exchange("binance");
        let sampler = Sampler::new(Vec::new(), Vec::new(), Duration::from_millis(200));

        let quotes = sampler
            .sample_triangle(&exchange, &TrianglePath::default())
            .await
            .unwrap();
        assert_eq!(quotes.exchange, "binance");
        assert_eq!(quotes.entry.ask, 50_000.0);
        assert_eq!(quotes.cross.ask, 0.05);
        assert_eq!(quotes.exit.bid, 2_600.0);
    }

    #[tokio::test]
    async fn test_sample_triangle_missing_leg() {
        let exchange = MockExchange::new("binance")
            .with_ticker("BTC/USDT", 49_990.0, 50_000.0)
            .with_ticker("ETH/USDT", 2_600.0, 2_601.0);
        let sampler = Sampler::new(Vec::new(), Vec::new(), Duration::from_millis(200));

        assert!(sampler
            .sample_triangle(&exchange, &TrianglePath::default())
            .await
            .is_none());
        assert_eq!(exchange.calls(), 3);
    }
}
