//! Kraken spot REST adapter
//!
//! GET /0/public/Ticker?pair=XBTUSDT
//! Result is keyed by Kraken's own pair name (which may differ from the
//! requested one), so the first entry is taken. Arrays: a = ask, b = bid,
//! c = last trade; element 0 is the price.

use super::{get_text, parse_price, ExchangeClient, FetchError, FetchResult};
use crate::types::{Ticker, TradingPair};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

const BASE_URL: &str = "https://api.kraken.com";
const UNKNOWN_PAIR: &str = "EQuery:Unknown asset pair";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: HashMap<String, PairTicker>,
}

#[derive(Debug, Deserialize)]
struct PairTicker {
    a: Vec<String>,
    b: Vec<String>,
    c: Vec<String>,
}

pub struct KrakenClient {
    http: reqwest::Client,
    base_url: String,
}

impl KrakenClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Kraken names bitcoin XBT
    fn asset(code: &str) -> &str {
        match code {
            "BTC" => "XBT",
            other => other,
        }
    }

    fn pair_name(pair: &TradingPair) -> String {
        format!("{}{}", Self::asset(&pair.base), Self::asset(&pair.quote))
    }

    async fn fetch(&self, pair: &TradingPair) -> FetchResult<String> {
        let url = format!(
            "{}/0/public/Ticker?pair={}",
            self.base_url,
            Self::pair_name(pair)
        );
        get_text(&self.http, &url).await
    }
}

fn first_price(field: &'static str, values: &[String]) -> FetchResult<f64> {
    let raw = values.first().ok_or(FetchError::MissingField(field))?;
    parse_price(field, raw)
}

pub(crate) fn parse_ticker_body(body: &str, pair: &TradingPair) -> FetchResult<Ticker> {
    let resp: TickerResponse = serde_json::from_str(body)?;
    if resp.error.iter().any(|e| e == UNKNOWN_PAIR) {
        return Err(FetchError::UnsupportedPair(pair.to_string()));
    }
    if !resp.error.is_empty() {
        return Err(FetchError::Exchange(resp.error.join("; ")));
    }
    let entry = resp
        .result
        .values()
        .next()
        .ok_or(FetchError::MissingField("result"))?;
    Ok(Ticker {
        bid: first_price("b", &entry.b)?,
        ask: first_price("a", &entry.a)?,
        last: first_price("c", &entry.c)?,
    })
}

#[async_trait]
impl ExchangeClient for KrakenClient {
    fn id(&self) -> &str {
        "kraken"
    }

    async fn get_last_price(&self, pair: &TradingPair) -> FetchResult<f64> {
        let body = self.fetch(pair).await?;
        parse_ticker_body(&body, pair).map(|t| t.last)
    }

    async fn get_ticker(&self, pair: &TradingPair) -> FetchResult<Ticker> {
        let body = self.fetch(pair).await?;
        parse_ticker_body(&body, pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc_usdt() -> TradingPair {
        TradingPair::new("BTC", "USDT")
    }

    #[test]
    fn test_pair_name() {
        assert_eq!(KrakenClient::pair_name(&TradingPair::new("BTC", "USDT")), "XBTUSDT");
        assert_eq!(KrakenClient::pair_name(&TradingPair::new("ETH", "BTC")), "ETHXBT");
    }

    #[test]
    fn test_parse_ticker_body() {
        let body = r#"{
            "error": [],
            "result": {
                "XBTUSDT": {
                    "a": ["67025.10000", "1", "1.000"],
                    "b": ["67025.00000", "2", "2.000"],
                    "c": ["67025.05000", "0.01000000"],
                    "v": ["10.1", "20.2"]
                }
            }
        }"#;
        let ticker = parse_ticker_body(body, &btc_usdt()).unwrap();
        assert_eq!(ticker.ask, 67025.1);
        assert_eq!(ticker.bid, 67025.0);
        assert_eq!(ticker.last, 67025.05);
    }

    #[test]
    fn test_error_array() {
        let body = r#"{"error":["EGeneral:Too many requests"]}"#;
        match parse_ticker_body(body, &btc_usdt()) {
            Err(FetchError::Exchange(msg)) => assert!(msg.contains("Too many requests")),
            other => panic!("expected exchange error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_pair() {
        let body = r#"{"error":["EQuery:Unknown asset pair"]}"#;
        match parse_ticker_body(body, &TradingPair::new("FOO", "BAR")) {
            Err(FetchError::UnsupportedPair(pair)) => assert_eq!(pair, "FOO/BAR"),
            other => panic!("expected unsupported pair, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_result() {
        let body = r#"{"error":[],"result":{}}"#;
        assert!(matches!(
            parse_ticker_body(body, &btc_usdt()),
            Err(FetchError::MissingField("result"))
        ));
    }
}
