//! Binance USDⓈ-M futures REST client

use super::{check_status, with_retries, MarketData, PriceField, Quote, RetryPolicy};
use crate::config::VenueConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const EXCHANGE_INFO_PATH: &str = "/fapi/v1/exchangeInfo";
const BOOK_TICKER_PATH: &str = "/fapi/v1/ticker/bookTicker";

/// Exchange info response (only the fields we read)
#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    #[serde(default)]
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    #[serde(default)]
    contract_type: String,
    #[serde(default)]
    status: String,
}

/// Book ticker entry, used by both the bulk and single-symbol endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicker {
    #[serde(default)]
    symbol: Option<String>,
    bid_price: Option<PriceField>,
    ask_price: Option<PriceField>,
}

/// Binance futures market data client (venue A)
pub struct BinanceFutures {
    client: Client,
    base_url: String,
    bulk_timeout: Duration,
    quote_timeout: Duration,
    list_retry: RetryPolicy,
    book_retry: RetryPolicy,
    quote_retry: RetryPolicy,
}

impl BinanceFutures {
    /// Create a client sharing the given connection pool
    pub fn new(client: Client, config: &VenueConfig) -> Self {
        Self {
            client,
            base_url: config.binance_base_url.trim_end_matches('/').to_string(),
            bulk_timeout: config.bulk_timeout(),
            quote_timeout: config.quote_timeout(),
            list_retry: RetryPolicy::new(
                config.list_retries,
                Duration::from_millis(config.list_retry_delay_ms),
            ),
            book_retry: RetryPolicy::new(
                config.book_retries,
                Duration::from_millis(config.book_retry_delay_ms),
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

    /// Keep only perpetual contracts that are currently trading
    fn parse_exchange_info(body: &str) -> Result<Vec<String>, FetchError> {
        let info: ExchangeInfo = serde_json::from_str(body)?;
        Ok(info
            .symbols
            .into_iter()
            .filter(|s| s.contract_type == "PERPETUAL" && s.status == "TRADING")
            .map(|s| s.symbol)
            .collect())
    }

    /// Parse the bulk book ticker, skipping entries without a usable quote
    fn parse_book(body: &str) -> Result<HashMap<String, Quote>, FetchError> {
        let tickers: Vec<BookTicker> = serde_json::from_str(body)?;
        Ok(tickers
            .into_iter()
            .filter_map(|t| {
                let quote = Quote::from_raw(t.bid_price.as_ref(), t.ask_price.as_ref()).ok()?;
                Some((t.symbol?, quote))
            })
            .collect())
    }

    fn parse_ticker(body: &str) -> Result<Quote, FetchError> {
        let ticker: BookTicker = serde_json::from_str(body)?;
        Quote::from_raw(ticker.bid_price.as_ref(), ticker.ask_price.as_ref())
    }
}

#[async_trait]
impl MarketData for BinanceFutures {
    fn name(&self) -> &str {
        "Binance"
    }

    async fn list_instruments(&self) -> Vec<String> {
        let result = with_retries(self.list_retry, || async move {
            let body = self
                .get_text(EXCHANGE_INFO_PATH, &[], self.bulk_timeout)
                .await?;
            Self::parse_exchange_info(&body)
        })
        .await;

        match result {
            Ok(symbols) => {
                tracing::debug!(count = symbols.len(), "Fetched Binance instruments");
                symbols
            }
            Err(e) => {
                tracing::warn!(error = %e, "Binance instrument list unavailable");
                Vec::new()
            }
        }
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        with_retries(self.quote_retry, || async move {
            let body = self
                .get_text(BOOK_TICKER_PATH, &[("symbol", symbol)], self.quote_timeout)
                .await?;
            Self::parse_ticker(&body)
        })
        .await
    }

    async fn book(&self) -> Result<HashMap<String, Quote>, FetchError> {
        with_retries(self.book_retry, || async move {
            let body = self
                .get_text(BOOK_TICKER_PATH, &[], self.bulk_timeout)
                .await?;
            Self::parse_book(&body)
        })
        .await
    }
}
