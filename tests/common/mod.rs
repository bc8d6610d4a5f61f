//! In-memory market and notifier for integration testing.
//!
//! `MockMarket` serves fixed tickers, per-symbol candle series and prices,
//! and records every call. `RecordingNotifier` keeps the texts it was
//! asked to deliver. Neither touches the network.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use smc_scanner::config::{DetectionConfig, UniverseConfig};
use smc_scanner::engine::{OpportunityEvaluator, Scanner, ScheduleSettings, UniverseFilter, WatchList};
use smc_scanner::market::MarketData;
use smc_scanner::notify::{Formatting, Notifier};
use smc_scanner::types::*;

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockMarket {
    tickers: Arc<Mutex<Vec<Ticker>>>,
    candles: Arc<Mutex<HashMap<String, CandleSeries>>>,
    prices: Arc<Mutex<HashMap<String, Decimal>>>,
    /// Symbols whose candle and price calls fail transiently.
    failing: Arc<Mutex<HashSet<String>>>,
    candle_calls: Arc<Mutex<Vec<String>>>,
    price_calls: Arc<Mutex<Vec<String>>>,
    /// Per-symbol stall before candles are returned.
    candle_delays: Arc<Mutex<HashMap<String, std::time::Duration>>>,
    /// If set, the ticker snapshot returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tickers(&self, tickers: Vec<Ticker>) {
        *self.tickers.lock().unwrap() = tickers;
    }

    pub fn set_candles(&self, symbol: &str, bars: &[(Decimal, Decimal)]) {
        self.candles
            .lock()
            .unwrap()
            .insert(symbol.to_string(), series_for(symbol, bars));
    }

    pub fn set_series(&self, series: CandleSeries) {
        self.candles.lock().unwrap().insert(series.symbol.clone(), series);
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    pub fn fail_symbol(&self, symbol: &str) {
        self.failing.lock().unwrap().insert(symbol.to_string());
    }

    pub fn set_candle_delay(&self, symbol: &str, delay: std::time::Duration) {
        self.candle_delays.lock().unwrap().insert(symbol.to_string(), delay);
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn candle_calls(&self) -> Vec<String> {
        self.candle_calls.lock().unwrap().clone()
    }

    pub fn price_calls(&self) -> Vec<String> {
        self.price_calls.lock().unwrap().clone()
    }

    fn check_failing(&self, symbol: &str) -> Result<(), MarketDataError> {
        if self.failing.lock().unwrap().contains(symbol) {
            return Err(MarketDataError::Transient(format!("{symbol}: connection reset")));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketData for MockMarket {
    async fn list_tickers(&self) -> Result<Vec<Ticker>, MarketDataError> {
        if let Some(ref msg) = *self.force_error.lock().unwrap() {
            return Err(MarketDataError::Transient(msg.clone()));
        }
        Ok(self.tickers.lock().unwrap().clone())
    }

    async fn get_candles(
        &self,
        symbol: &str,
        _interval: CandleInterval,
        limit: usize,
    ) -> Result<CandleSeries, MarketDataError> {
        self.candle_calls.lock().unwrap().push(symbol.to_string());
        self.check_failing(symbol)?;
        let delay = self.candle_delays.lock().unwrap().get(symbol).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let series = self.candles.lock().unwrap().get(symbol).cloned();
        // Unconfigured symbols trade flat: enough data, no pattern.
        Ok(series.unwrap_or_else(|| series_for(symbol, &vec![(dec!(10), dec!(9)); limit])))
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        self.price_calls.lock().unwrap().push(symbol.to_string());
        self.check_failing(symbol)?;
        self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| MarketDataError::UnknownSymbol(symbol.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail. Failed texts are not recorded.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, _chat_target: &str, text: &str, _formatting: Formatting) -> Result<(), ScannerError> {
        if *self.failing.lock().unwrap() {
            return Err(ScannerError::Notify {
                channel: "recording".into(),
                message: "HTTP 502".into(),
            });
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Hourly candles from `(high, low)` pairs; close is the midpoint.
pub fn series_for(symbol: &str, bars: &[(Decimal, Decimal)]) -> CandleSeries {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let candles = bars
        .iter()
        .enumerate()
        .map(|(i, &(high, low))| Candle {
            open: low,
            high,
            low,
            close: (high + low) / dec!(2),
            volume: dec!(100),
            timestamp: start + Duration::hours(i as i64 + 1),
        })
        .collect();
    CandleSeries::new(symbol, CandleInterval::OneHour, candles)
}

/// 100 candles holding a structure break above 200 and an unfilled
/// discount-zone gap between 110 and 120. Last close is 180.
pub fn setup_bars() -> Vec<(Decimal, Decimal)> {
    let mut bars = vec![(dec!(110), dec!(100)); 100];
    for bar in bars.iter_mut().skip(62) {
        *bar = (dec!(190), dec!(121));
    }
    bars[61] = (dec!(150), dec!(111));
    bars[62] = (dec!(170), dec!(120));
    bars[80] = (dec!(200), dec!(125));
    bars[99] = (dec!(210), dec!(150));
    bars
}

/// The `setup_bars` pattern whose last candle wicks above 200 but closes
/// back inside the gap at 116.
pub fn setup_series_in_gap(symbol: &str) -> CandleSeries {
    let mut bars = setup_bars();
    bars[99] = (dec!(210), dec!(112));
    let mut candles = series_for(symbol, &bars).candles().to_vec();
    if let Some(last) = candles.last_mut() {
        last.close = dec!(116);
    }
    CandleSeries::new(symbol, CandleInterval::OneHour, candles)
}

/// `n` liquid USDT tickers named `SYM0USDT`, `SYM1USDT`, ... with volume
/// decreasing by index.
pub fn tickers(n: usize) -> Vec<Ticker> {
    (0..n)
        .map(|i| {
            Ticker::new(
                &format!("SYM{i}USDT"),
                dec!(5),
                Decimal::from(1_000_000 - i as i64 * 1_000),
            )
        })
        .collect()
}

/// Settings with millisecond pacing so passes finish quickly.
pub fn fast_settings() -> ScheduleSettings {
    ScheduleSettings {
        discovery_interval: std::time::Duration::from_secs(3600),
        recheck_interval: std::time::Duration::from_secs(300),
        initial_delay: std::time::Duration::from_secs(10),
        discovery_pacing: std::time::Duration::from_millis(1),
        recheck_pacing: std::time::Duration::from_millis(1),
        call_timeout: std::time::Duration::from_secs(5),
        watch_ttl: None,
        notify_on_watch: false,
    }
}

pub fn build_scanner(
    mode: AlertMode,
    market: Arc<MockMarket>,
    notifier: Arc<RecordingNotifier>,
    settings: ScheduleSettings,
) -> Scanner {
    let evaluator = OpportunityEvaluator::from_detection(mode, &DetectionConfig::default(), settings.call_timeout);
    Scanner::new(
        market,
        notifier,
        "chat-1".into(),
        UniverseFilter::new(UniverseConfig::default()),
        evaluator,
        Arc::new(WatchList::new(50)),
        settings,
    )
}
