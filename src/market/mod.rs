//! Market-data integrations.
//!
//! Defines the `MarketData` trait the engine scans through and provides
//! the Binance spot implementation.

pub mod binance;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;

use crate::types::{CandleInterval, CandleSeries, MarketDataError, Ticker};

/// Abstraction over a market-data provider.
///
/// Implementations must report transient failures (network, rate limit,
/// timeout) distinctly from an unknown symbol.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Exchange-wide ticker snapshot.
    async fn list_tickers(&self) -> Result<Vec<Ticker>, MarketDataError>;

    /// The most recent `limit` candles, oldest first.
    async fn get_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<CandleSeries, MarketDataError>;

    /// Latest traded price.
    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, MarketDataError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Run a provider call with an upper bound on its duration.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, MarketDataError>
where
    F: Future<Output = Result<T, MarketDataError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(MarketDataError::Timeout(limit.as_secs())),
    }
}
