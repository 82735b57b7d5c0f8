//! Venue market data module
//!
//! REST clients for the two compared perpetual-futures venues:
//! Binance USDⓈ-M futures (venue A) and KuCoin futures (venue B).

mod binance;
mod kucoin;
mod types;

pub use binance::BinanceFutures;
pub use kucoin::KucoinFutures;
pub use types::{PriceField, Quote, VenueSide};

use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Trait for venue market data providers
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Venue display name
    fn name(&self) -> &str;

    /// Native symbols of every tradable perpetual.
    ///
    /// Never fails outward: a venue that cannot be reached yields an empty list.
    async fn list_instruments(&self) -> Vec<String>;

    /// Best bid/ask for one native symbol
    async fn quote(&self, symbol: &str) -> Result<Quote, FetchError>;

    /// Best bid/ask for every instrument in one bulk call
    async fn book(&self) -> Result<HashMap<String, Quote>, FetchError> {
        Err(FetchError::Unsupported)
    }
}

/// Bounded retry policy for one kind of request
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Run `op` up to `policy.attempts` times, sleeping between failures.
///
/// Returns the first success or the last error.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.attempts => return Err(e),
            Err(e) => {
                tracing::trace!(attempt, error = %e, "Retrying venue request");
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// Map a non-success HTTP status to a fetch error
pub(crate) fn check_status(response: &reqwest::Response) -> Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}
