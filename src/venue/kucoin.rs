//! KuCoin futures REST client

use super::{check_status, with_retries, MarketData, PriceField, Quote, RetryPolicy};
use crate::config::VenueConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const ACTIVE_CONTRACTS_PATH: &str = "/api/v1/contracts/active";
const TICKER_PATH: &str = "/api/v1/ticker";

/// Standard KuCoin response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Contract {
    symbol: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    best_bid_price: Option<PriceField>,
    best_ask_price: Option<PriceField>,
    bid: Option<PriceField>,
    ask: Option<PriceField>,
}

impl Ticker {
    /// Best bid/ask, falling back to the plain bid/ask fields
    fn quote(&self) -> Result<Quote, FetchError> {
        let bid = non_zero(&self.best_bid_price).or(self.bid.as_ref());
        let ask = non_zero(&self.best_ask_price).or(self.ask.as_ref());
        Quote::from_raw(bid, ask)
    }
}

fn non_zero(field: &Option<PriceField>) -> Option<&PriceField> {
    field
        .as_ref()
        .filter(|f| f.value().is_some_and(|v| !v.is_zero()))
}

/// KuCoin futures market data client (venue B)
pub struct KucoinFutures {
    client: Client,
    base_url: String,
    bulk_timeout: Duration,
    quote_timeout: Duration,
    list_retry: RetryPolicy,
    quote_retry: RetryPolicy,
}

impl KucoinFutures {
    /// Create a client sharing the given connection pool
    pub fn new(client: Client, config: &VenueConfig) -> Self {
        Self {
            client,
            base_url: config.kucoin_base_url.trim_end_matches('/').to_string(),
            bulk_timeout: config.bulk_timeout(),
            quote_timeout: config.quote_timeout(),
            list_retry: RetryPolicy::new(
                config.list_retries,
                Duration::from_millis(config.list_retry_delay_ms),
            ),
            quote_retry: RetryPolicy::new(
                config.quote_retries,
                Duration::from_millis(config.quote_retry_delay_ms),
            ),
        }
    }

    async fn get_text(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(timeout)
            .send()
            .await?;
        check_status(&response)?;
        Ok(response.text().await?)
    }

    /// Keep only contracts whose status is "open"
    fn parse_contracts(body: &str) -> Result<Vec<String>, FetchError> {
        let envelope: Envelope<Vec<Contract>> = serde_json::from_str(body)?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.status.eq_ignore_ascii_case("open"))
            .map(|c| c.symbol)
            .collect())
    }

    fn parse_ticker(body: &str) -> Result<Quote, FetchError> {
        let envelope: Envelope<Ticker> = serde_json::from_str(body)?;
        match envelope.data {
            Some(ticker) => ticker.quote(),
            None => Err(FetchError::Decode(format!(
                "ticker without data (code {})",
                envelope.code.as_deref().unwrap_or("none")
            ))),
        }
    }
}

#[async_trait]
impl MarketData for KucoinFutures {
    fn name(&self) -> &str {
        "KuCoin"
    }

    async fn list_instruments(&self) -> Vec<String> {
        let result = with_retries(self.list_retry, || async move {
            let body = self
                .get_text(ACTIVE_CONTRACTS_PATH, &[], self.bulk_timeout)
                .await?;
            Self::parse_contracts(&body)
        })
        .await;

        match result {
            Ok(symbols) => {
                tracing::debug!(count = symbols.len(), "Fetched KuCoin instruments");
                symbols
            }
            Err(e) => {
                tracing::warn!(error = %e, "KuCoin instrument list unavailable");
                Vec::new()
            }
        }
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        with_retries(self.quote_retry, || async move {
            let body = self
                .get_text(TICKER_PATH, &[("symbol", symbol)], self.quote_timeout)
                .await?;
            Self::parse_ticker(&body)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_contracts() {
        let body = r#"{
            "code": "200000",
            "data": [
                {"symbol": "XBTUSDTM", "status": "Open", "rootSymbol": "USDT"},
                {"symbol": "ETHUSDTM", "status": "open"},
                {"symbol": "LUNAUSDTM", "status": "Paused"}
            ]
        }"#;

        let symbols = KucoinFutures::parse_contracts(body).unwrap();
        assert_eq!(symbols, vec!["XBTUSDTM", "ETHUSDTM"]);
    }

    #[test]
    fn test_parse_contracts_no_data() {
        let symbols = KucoinFutures::parse_contracts(r#"{"code": "400100"}"#).unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn test_parse_ticker_best_prices() {
        let body = r#"{
            "code": "200000",
            "data": {"symbol": "ETHUSDTM", "bestBidPrice": "3000.5", "bestAskPrice": "3000.6", "price": "3000.55"}
        }"#;

        let quote = KucoinFutures::parse_ticker(body).unwrap();
        assert_eq!(quote.bid(), dec!(3000.5));
        assert_eq!(quote.ask(), dec!(3000.6));
    }

    #[test]
    fn test_parse_ticker_numeric_fallback() {
        let body = r#"{"code": "200000", "data": {"bestBidPrice": "0", "bid": 12.5, "ask": 13}}"#;

        let quote = KucoinFutures::parse_ticker(body).unwrap();
        assert_eq!(quote.bid(), dec!(12.5));
        assert_eq!(quote.ask(), dec!(13));
    }

    #[test]
    fn test_parse_ticker_invalid_quote() {
        let body = r#"{"code": "200000", "data": {"bestBidPrice": "0", "bestAskPrice": "0"}}"#;
        assert_eq!(
            KucoinFutures::parse_ticker(body),
            Err(FetchError::InvalidQuote)
        );
    }

    #[test]
    fn test_parse_ticker_missing_data() {
        let result = KucoinFutures::parse_ticker(r#"{"code": "300000", "msg": "bad symbol"}"#);
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }
}
