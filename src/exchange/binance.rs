//! Binance spot REST adapter
//!
//! Last price: GET /api/v3/ticker/price?symbol=BTCUSDT
//! Ticker:     GET /api/v3/ticker/24hr?symbol=BTCUSDT (lastPrice, bidPrice, askPrice)

use super::{get_text, parse_price, ExchangeClient, FetchResult};
use crate::types::{Ticker, TradingPair};
use async_trait::async_trait;
use serde::Deserialize;

const BASE_URL: &str = "https://api.binance.com";

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayTickerResponse {
    last_price: String,
    bid_price: String,
    ask_price: String,
}

pub struct BinanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    /// BTC/USDT → BTCUSDT
    fn symbol(pair: &TradingPair) -> String {
        format!("{}{}", pair.base, pair.quote)
    }
}

pub(crate) fn parse_price_body(body: &str) -> FetchResult<f64> {
    let resp: PriceResponse = serde_json::from_str(body)?;
    parse_price("price", &resp.price)
}

pub(crate) fn parse_ticker_body(body: &str) -> FetchResult<Ticker> {
    let resp: DayTickerResponse = serde_json::from_str(body)?;
    Ok(Ticker {
        bid: parse_price("bidPrice", &resp.bid_price)?,
        ask: parse_price("askPrice", &resp.ask_price)?,
        last: parse_price("lastPrice", &resp.last_price)?,
    })
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn id(&self) -> &str {
        "binance"
    }

    async fn get_last_price(&self, pair: &TradingPair) -> FetchResult<f64> {
        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            self.base_url,
            Self::symbol(pair)
        );
        let body = get_text(&self.http, &url).await?;
        parse_price_body(&body)
    }

    async fn get_ticker(&self, pair: &TradingPair) -> FetchResult<Ticker> {
        let url = format!(
            "{}/api/v3/ticker/24hr?symbol={}",
            self.base_url,
            Self::symbol(pair)
        );
        let body = get_text(&self.http, &url).await?;
        parse_ticker_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::FetchError;

    #[test]
    fn test_symbol() {
        let pair = TradingPair::new("eth", "btc");
        assert_eq!(BinanceClient::symbol(&pair), "ETHBTC");
    }

    #[test]
    fn test_parse_price_body() {
        let body = r#"{"symbol":"BTCUSDT","price":"67012.45000000"}"#;
        assert_eq!(parse_price_body(body).unwrap(), 67012.45);
    }

    #[test]
    fn test_parse_ticker_body() {
        let body = r#"{
            "symbol": "ETHUSDT",
            "priceChange": "-12.10000000",
            "lastPrice": "2601.50000000",
            "bidPrice": "2601.49000000",
            "askPrice": "2601.51000000",
            "volume": "1234.5"
        }"#;
        let ticker = parse_ticker_body(body).unwrap();
        assert_eq!(ticker.last, 2601.5);
        assert_eq!(ticker.bid, 2601.49);
        assert_eq!(ticker.ask, 2601.51);
    }

    #[test]
    fn test_error_body_is_decode_error() {
        let body = r#"{"code":-1121,"msg":"Invalid symbol."}"#;
        assert!(matches!(parse_price_body(body), Err(FetchError::Decode(_))));
    }
}
