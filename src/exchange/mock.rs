//! In-memory exchange for tests

use super::{ExchangeClient, FetchError, FetchResult};
use crate::types::{Ticker, TradingPair};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves fixed prices/tickers; unknown pairs fail with `UnsupportedPair`
pub struct MockExchange {
    id: String,
    prices: Mutex<HashMap<String, f64>>,
    tickers: Mutex<HashMap<String, Ticker>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockExchange {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            prices: Mutex::new(HashMap::new()),
            tickers: Mutex::new(HashMap::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_price(self, pair: &str, price: f64) -> Self {
        self.prices.lock().unwrap().insert(pair.to_string(), price);
        self
    }

    pub fn with_ticker(self, pair: &str, bid: f64, ask: f64) -> Self {
        let last = (bid + ask) / 2.0;
        self.tickers
            .lock()
            .unwrap()
            .insert(pair.to_string(), Ticker { bid, ask, last });
        self
    }

    /// Sleep before answering, to exercise fetch timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_price(&self, pair: &str, price: f64) {
        self.prices.lock().unwrap().insert(pair.to_string(), price);
    }

    pub fn remove_price(&self, pair: &str) {
        self.prices.lock().unwrap().remove(pair);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get_last_price(&self, pair: &TradingPair) -> FetchResult<f64> {
        self.wait().await;
        self.prices
            .lock()
            .unwrap()
            .get(&pair.to_string())
            .copied()
            .ok_or_else(|| FetchError::UnsupportedPair(pair.to_string()))
    }

    async fn get_ticker(&self, pair: &TradingPair) -> FetchResult<Ticker> {
        self.wait().await;
        self.tickers
            .lock()
            .unwrap()
            .get(&pair.to_string())
            .copied()
            .ok_or_else(|| FetchError::UnsupportedPair(pair.to_string()))
    }
}
