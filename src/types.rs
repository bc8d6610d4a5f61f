//! Shared types for the scanner.
//!
//! These types form the data model used across all modules so that the
//! market adapters, detectors and engine can depend on them without
//! circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Candles
// ---------------------------------------------------------------------------

/// A single OHLCV candle. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// Close time of the candle.
    pub timestamp: DateTime<Utc>,
}

/// Ordered candles for one symbol and one interval, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    pub symbol: String,
    pub interval: CandleInterval,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>, interval: CandleInterval, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            candles,
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// The trailing `n` candles (or all of them when fewer exist).
    pub fn tail(&self, n: usize) -> &[Candle] {
        let start = self.candles.len().saturating_sub(n);
        &self.candles[start..]
    }
}

/// Candle interval as understood by the exchange API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl CandleInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::ThirtyMinutes => "30m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::OneDay => "1d",
        }
    }
}

impl Default for CandleInterval {
    fn default() -> Self {
        CandleInterval::OneHour
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = ScannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(CandleInterval::OneMinute),
            "5m" => Ok(CandleInterval::FiveMinutes),
            "15m" => Ok(CandleInterval::FifteenMinutes),
            "30m" => Ok(CandleInterval::ThirtyMinutes),
            "1h" => Ok(CandleInterval::OneHour),
            "4h" => Ok(CandleInterval::FourHours),
            "1d" => Ok(CandleInterval::OneDay),
            other => Err(ScannerError::Config(format!("Unknown candle interval: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tickers
// ---------------------------------------------------------------------------

/// One entry of the exchange-wide 24h ticker snapshot.
///
/// Numeric fields are optional: the exchange occasionally returns entries
/// without a price, and those are skipped by the universe filter rather
/// than failing the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: Option<Decimal>,
    pub quote_volume: Option<Decimal>,
}

impl Ticker {
    pub fn new(symbol: &str, last_price: Decimal, quote_volume: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            last_price: Some(last_price),
            quote_volume: Some(quote_volume),
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// A bullish break of structure: recent price exceeded a prior swing high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureBreak {
    /// The prior swing high that was broken.
    pub reference_price: Decimal,
    pub trigger_time: DateTime<Utc>,
}

/// An unfilled bullish fair-value gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGap {
    pub top: Decimal,
    pub bottom: Decimal,
    /// Close time of the third candle of the imbalance.
    pub created_at: DateTime<Utc>,
}

impl PriceGap {
    /// Whether `price` lies inside the gap, bounds inclusive.
    pub fn contains(&self, price: Decimal) -> bool {
        within(self.bottom, self.top, price)
    }
}

impl fmt::Display for PriceGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} – {}]", self.bottom, self.top)
    }
}

/// A symbol that passed both detectors in one discovery pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub symbol: String,
    pub gap: PriceGap,
    pub structure_break: StructureBreak,
    pub price_at_detection: Decimal,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} (BOS {} | FVG {})",
            self.symbol, self.price_at_detection, self.structure_break.reference_price, self.gap,
        )
    }
}

// ---------------------------------------------------------------------------
// Watch-list
// ---------------------------------------------------------------------------

/// An accepted opportunity waiting for price to revisit its gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedEntry {
    pub symbol: String,
    pub gap_top: Decimal,
    pub gap_bottom: Decimal,
    pub added_at: DateTime<Utc>,
}

impl WatchedEntry {
    pub fn from_opportunity(opp: &Opportunity, added_at: DateTime<Utc>) -> Self {
        Self {
            symbol: opp.symbol.clone(),
            gap_top: opp.gap.top,
            gap_bottom: opp.gap.bottom,
            added_at,
        }
    }

    /// Trigger condition: price back inside the recorded gap.
    pub fn is_triggered_by(&self, price: Decimal) -> bool {
        within(self.gap_bottom, self.gap_top, price)
    }
}

fn within(bottom: Decimal, top: Decimal, price: Decimal) -> bool {
    bottom <= price && price <= top
}

/// How accepted opportunities are turned into alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// Push onto the watch-list; alert when price revisits the gap.
    Deferred,
    /// Alert immediately when the current close is already inside the gap.
    Instant,
}

impl Default for AlertMode {
    fn default() -> Self {
        AlertMode::Deferred
    }
}

impl fmt::Display for AlertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMode::Deferred => write!(f, "deferred"),
            AlertMode::Instant => write!(f, "instant"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pass reports
// ---------------------------------------------------------------------------

/// Summary of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryReport {
    pub started_at: Option<DateTime<Utc>>,
    pub candidates: usize,
    pub evaluated: usize,
    pub skipped_watched: usize,
    pub failed: usize,
    pub opportunities: usize,
    pub inserted: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    /// Set when shutdown stopped the pass before the last candidate.
    pub interrupted: bool,
}

impl fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discovery: candidates={} evaluated={} skipped={} failed={} opportunities={} inserted={} alerts={}",
            self.candidates,
            self.evaluated,
            self.skipped_watched,
            self.failed,
            self.opportunities,
            self.inserted,
            self.alerts_sent,
        )
    }
}

/// Summary of one watch-list re-check pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecheckReport {
    pub started_at: Option<DateTime<Utc>>,
    pub checked: usize,
    pub triggered: usize,
    pub evicted: usize,
    pub failed: usize,
    pub alerts_failed: usize,
    pub interrupted: bool,
}

impl fmt::Display for RecheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recheck: checked={} triggered={} evicted={} failed={}",
            self.checked, self.triggered, self.evicted, self.failed,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures surfaced by a market-data provider.
///
/// Transient failures (network, timeout, rate limit) are kept distinct
/// from an unknown symbol so callers can tell "try later" from "never".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketDataError {
    #[error("Market data request failed: {0}")]
    Transient(String),

    #[error("Market data rate limit hit: {0}")]
    RateLimited(String),

    #[error("Market data request timed out after {0}s")]
    Timeout(u64),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Malformed market data: {0}")]
    Malformed(String),
}

impl MarketDataError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MarketDataError::Transient(_) | MarketDataError::RateLimited(_) | MarketDataError::Timeout(_)
        )
    }
}

/// Domain-specific error types for the scanner.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error("Notification error ({channel}): {message}")]
    Notify { channel: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Watch-list already holds an entry for {0}")]
    DuplicateWatch(String),

    #[error("Watch-list is full ({0} entries)")]
    WatchListFull(usize),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
