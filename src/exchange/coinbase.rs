//! Coinbase Exchange REST adapter
//!
//! GET /products/BTC-USDT/ticker returns price, bid and ask in one call,
//! so both operations hit the same endpoint.

use super::{get_text, parse_price, ExchangeClient, FetchError, FetchResult};
use crate::types::{Ticker, TradingPair};
use async_trait::async_trait;
use serde::Deserialize;

const BASE_URL: &str = "https://api.exchange.coinbase.com";

#[derive(Debug, Deserialize)]
struct ProductTicker {
    price: Option<String>,
    bid: Option<String>,
    ask: Option<String>,
    message: Option<String>,
}

pub struct CoinbaseClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinbaseClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    /// BTC/USDT → BTC-USDT
    fn product_id(pair: &TradingPair) -> String {
        format!("{}-{}", pair.base, pair.quote)
    }

    async fn fetch(&self, pair: &TradingPair) -> FetchResult<String> {
        let url = format!(
            "{}/products/{}/ticker",
            self.base_url,
            Self::product_id(pair)
        );
        get_text(&self.http, &url).await
    }
}

fn decode(body: &str) -> FetchResult<ProductTicker> {
    let resp: ProductTicker = serde_json::from_str(body)?;
    if let Some(message) = resp.message.as_ref() {
        return Err(FetchError::Exchange(message.clone()));
    }
    Ok(resp)
}

pub(crate) fn parse_ticker_body(body: &str) -> FetchResult<Ticker> {
    let resp = decode(body)?;
    let last = resp.price.ok_or(FetchError::MissingField("price"))?;
    let bid = resp.bid.ok_or(FetchError::MissingField("bid"))?;
    let ask = resp.ask.ok_or(FetchError::MissingField("ask"))?;
    Ok(Ticker {
        bid: parse_price("bid", &bid)?,
        ask: parse_price("ask", &ask)?,
        last: parse_price("price", &last)?,
    })
}

pub(crate) fn parse_price_body(body: &str) -> FetchResult<f64> {
    let resp = decode(body)?;
    let last = resp.price.ok_or(FetchError::MissingField("price"))?;
    parse_price("price", &last)
}

#[async_trait]
impl ExchangeClient for CoinbaseClient {
    fn id(&self) -> &str {
        "coinbase"
    }

    async fn get_last_price(&self, pair: &TradingPair) -> FetchResult<f64> {
        let body = self.fetch(pair).await?;
        parse_price_body(&body)
    }

    async fn get_ticker(&self, pair: &TradingPair) -> FetchResult<Ticker> {
        let body = self.fetch(pair).await?;
        parse_ticker_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "ask": "67020.01",
        "bid": "67019.99",
        "volume": "12.3",
        "trade_id": 123456,
        "price": "67020.00",
        "size": "0.001",
        "time": "2026-10-14T10:00:00.000000Z"
    }"#;

    #[test]
    fn test_product_id() {
        assert_eq!(CoinbaseClient::product_id(&TradingPair::new("eth", "btc")), "ETH-BTC");
    }

    #[test]
    fn test_parse_ticker_body() {
        let ticker = parse_ticker_body(BODY).unwrap();
        assert_eq!(ticker.last, 67020.0);
        assert_eq!(ticker.bid, 67019.99);
        assert_eq!(ticker.ask, 67020.01);
        assert_eq!(parse_price_body(BODY).unwrap(), 67020.0);
    }

    #[test]
    fn test_not_found_message() {
        let body = r#"{"message":"NotFound"}"#;
        match parse_price_body(body) {
            Err(FetchError::Exchange(msg)) => assert_eq!(msg, "NotFound"),
            other => panic!("expected exchange error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_bid() {
        let body = r#"{"price":"1.0","ask":"1.1"}"#;
        assert!(matches!(
            parse_ticker_body(body),
            Err(FetchError::MissingField("bid"))
        ));
    }
}
