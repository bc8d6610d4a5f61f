//! Binance spot market-data client.
//!
//! Public REST endpoints only; no API key is needed for scanning.
//!
//! API docs: https://developers.binance.com/docs/binance-spot-api-docs/rest-api
//! Base URL: https://api.binance.com
//! Rate limit: request weight per minute per IP (HTTP 429, then 418 ban).

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::MarketData;
use crate::types::{Candle, CandleInterval, CandleSeries, MarketDataError, Ticker};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const PROVIDER_NAME: &str = "binance";

/// Binance error code for an unknown trading pair.
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Kline row layout: `[openTime, open, high, low, close, volume, closeTime, ...]`.
const KLINE_OPEN: usize = 1;
const KLINE_HIGH: usize = 2;
const KLINE_LOW: usize = 3;
const KLINE_CLOSE: usize = 4;
const KLINE_VOLUME: usize = 5;
const KLINE_CLOSE_TIME: usize = 6;

// ---------------------------------------------------------------------------
// API response types (Binance JSON → Rust)
// ---------------------------------------------------------------------------

/// Entry of `/api/v3/ticker/24hr`. Numbers arrive as strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker {
    symbol: String,
    #[serde(default)]
    last_price: Option<String>,
    #[serde(default)]
    quote_volume: Option<String>,
}

/// Response of `/api/v3/ticker/price?symbol=`.
#[derive(Debug, Deserialize)]
struct BinancePrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct BinanceErrorBody {
    code: i64,
    #[serde(default)]
    msg: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct BinanceClient {
    http: Client,
    base_url: String,
    timeout_secs: u64,
}

impl BinanceClient {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("smc-scanner/0.1.0")
            .build()
            .map_err(|e| {
                MarketDataError::Transient(format!("Failed to build HTTP client for Binance: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    // -- Internal helpers ------------------------------------------------

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: Option<&str>,
    ) -> Result<T, MarketDataError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Binance request");

        let resp = self.http.get(&url).send().await.map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_error(status, &body, symbol));
        }

        resp.json::<T>()
            .await
            .map_err(|e| MarketDataError::Malformed(format!("Binance {path}: {e}")))
    }

    fn request_error(&self, e: reqwest::Error) -> MarketDataError {
        if e.is_timeout() {
            MarketDataError::Timeout(self.timeout_secs)
        } else {
            MarketDataError::Transient(format!("Binance request failed: {e}"))
        }
    }
}

/// Map a non-success HTTP response onto the error taxonomy.
fn classify_error(status: StatusCode, body: &str, symbol: Option<&str>) -> MarketDataError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
        return MarketDataError::RateLimited(format!("Binance {status}"));
    }
    if status == StatusCode::BAD_REQUEST {
        if let Ok(err) = serde_json::from_str::<BinanceErrorBody>(body) {
            if err.code == INVALID_SYMBOL_CODE {
                return MarketDataError::UnknownSymbol(symbol.unwrap_or_default().to_string());
            }
            return MarketDataError::Malformed(format!("Binance {status} ({}): {}", err.code, err.msg));
        }
    }
    MarketDataError::Transient(format!("Binance API error {status}: {body}"))
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

fn ms_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn to_ticker(t: BinanceTicker) -> Ticker {
    Ticker {
        last_price: t.last_price.as_deref().and_then(parse_decimal),
        quote_volume: t.quote_volume.as_deref().and_then(parse_decimal),
        symbol: t.symbol,
    }
}

fn parse_kline(row: &[serde_json::Value]) -> Option<Candle> {
    let dec_at = |i: usize| row.get(i)?.as_str().and_then(parse_decimal);
    Some(Candle {
        open: dec_at(KLINE_OPEN)?,
        high: dec_at(KLINE_HIGH)?,
        low: dec_at(KLINE_LOW)?,
        close: dec_at(KLINE_CLOSE)?,
        volume: dec_at(KLINE_VOLUME)?,
        timestamp: ms_to_datetime(row.get(KLINE_CLOSE_TIME)?.as_i64()?)?,
    })
}

fn parse_klines(symbol: &str, rows: &[Vec<serde_json::Value>]) -> Result<Vec<Candle>, MarketDataError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            parse_kline(row).ok_or_else(|| {
                MarketDataError::Malformed(format!("{symbol}: unparsable kline row {i}"))
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MarketData trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketData for BinanceClient {
    async fn list_tickers(&self) -> Result<Vec<Ticker>, MarketDataError> {
        let raw: Vec<BinanceTicker> = self.get_json("/api/v3/ticker/24hr", None).await?;
        info!(count = raw.len(), "Binance ticker snapshot fetched");
        Ok(raw.into_iter().map(to_ticker).collect())
    }

    async fn get_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<CandleSeries, MarketDataError> {
        let path = format!(
            "/api/v3/klines?symbol={}&interval={}&limit={}",
            urlencoding::encode(symbol),
            interval.as_str(),
            limit,
        );
        let rows: Vec<Vec<serde_json::Value>> = self.get_json(&path, Some(symbol)).await?;
        let candles = parse_klines(symbol, &rows)?;
        Ok(CandleSeries::new(symbol, interval, candles))
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        let path = format!("/api/v3/ticker/price?symbol={}", urlencoding::encode(symbol));
        let resp: BinancePrice = self.get_json(&path, Some(symbol)).await?;
        parse_decimal(&resp.price)
            .ok_or_else(|| MarketDataError::Malformed(format!("{symbol}: bad price {:?}", resp.price)))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
