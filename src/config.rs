//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default, so a missing section (or an empty file)
//! yields the stock hourly deferred-mode scanner. Secrets (bot token,
//! chat id) are referenced by env-var name and resolved at runtime.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::{AlertMode, CandleInterval, ScannerError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub universe: UniverseConfig,
    pub detection: DetectionConfig,
    pub schedule: ScheduleConfig,
    pub exchange: ExchangeConfig,
    pub alerts: AlertsConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    pub name: String,
    pub mode: AlertMode,
    /// Upper bound on watch-list size; a full list refuses new entries.
    pub max_watched: usize,
    /// Evict watched entries older than this. `None` keeps them forever.
    pub watch_ttl_secs: Option<u64>,
}

/// Longest accepted `watch_ttl_secs` (ten years).
pub const MAX_WATCH_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

impl ScannerConfig {
    /// Configured TTL as a signed duration; `None` when unset or out of range.
    pub fn watch_ttl(&self) -> Option<chrono::Duration> {
        let secs = i64::try_from(self.watch_ttl_secs?).ok()?;
        chrono::Duration::try_seconds(secs)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            name: "SMC Sniper".to_string(),
            mode: AlertMode::Deferred,
            max_watched: 50,
            watch_ttl_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UniverseConfig {
    pub quote_suffix: String,
    /// Substrings marking leveraged tokens (excluded).
    pub excluded_markers: Vec<String>,
    /// Symbols must trade strictly below this price.
    pub price_ceiling: Decimal,
    pub top_n: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            quote_suffix: "USDT".to_string(),
            excluded_markers: vec!["UP".to_string(), "DOWN".to_string()],
            price_ceiling: dec!(100),
            top_n: 150,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DetectionConfig {
    pub interval: CandleInterval,
    pub min_candles: usize,
    /// Candles in the structure-break reference window.
    pub bos_lookback: usize,
    /// Most recent candles excluded from the reference window and
    /// tested for the break.
    pub bos_exclusion: usize,
    /// Candles in the trailing swing used for the discount threshold.
    pub swing_lookback: usize,
    pub discount_fraction: Decimal,
    pub discount_restricted: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval: CandleInterval::OneHour,
            min_candles: 100,
            bos_lookback: 50,
            bos_exclusion: 2,
            swing_lookback: 50,
            discount_fraction: dec!(0.5),
            discount_restricted: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Discovery cadence. Defaults to 3600 (deferred) or 1800 (instant).
    pub discovery_interval_secs: Option<u64>,
    pub recheck_interval_secs: u64,
    pub initial_delay_secs: u64,
    /// Pause between symbols in the discovery pass.
    pub discovery_pacing_ms: u64,
    /// Pause between symbols in the re-check pass.
    pub recheck_pacing_ms: u64,
    /// Upper bound for any single external call.
    pub call_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            discovery_interval_secs: None,
            recheck_interval_secs: 300,
            initial_delay_secs: 10,
            discovery_pacing_ms: 2000,
            recheck_pacing_ms: 1000,
            call_timeout_secs: 10,
        }
    }
}

impl ScheduleConfig {
    pub fn discovery_interval(&self, mode: AlertMode) -> Duration {
        let secs = self.discovery_interval_secs.unwrap_or(match mode {
            AlertMode::Deferred => 3600,
            AlertMode::Instant => 1800,
        });
        Duration::from_secs(secs)
    }

    pub fn recheck_interval(&self) -> Duration {
        Duration::from_secs(self.recheck_interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn discovery_pacing(&self) -> Duration {
        Duration::from_millis(self.discovery_pacing_ms)
    }

    pub fn recheck_pacing(&self) -> Duration {
        Duration::from_millis(self.recheck_pacing_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub http_timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            http_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertsConfig {
    pub telegram_bot_token_env: String,
    pub telegram_chat_id_env: String,
    pub notify_on_startup: bool,
    pub notify_on_watch: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token_env: "TELEGRAM_TOKEN".to_string(),
            telegram_chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            notify_on_startup: true,
            notify_on_watch: false,
        }
    }
}

impl AlertsConfig {
    /// Bot token and chat id, if both env vars are set and non-empty.
    pub fn telegram_credentials(&self) -> Option<(SecretString, String)> {
        let token = std::env::var(&self.telegram_bot_token_env).ok()?;
        let chat_id = std::env::var(&self.telegram_chat_id_env).ok()?;
        if token.trim().is_empty() || chat_id.trim().is_empty() {
            return None;
        }
        Some((SecretString::new(token), chat_id))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 10000,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scanner cannot run with.
    pub fn validate(&self) -> Result<(), ScannerError> {
        let d = &self.detection;
        if self.universe.top_n == 0 {
            return Err(ScannerError::Config("universe.top_n must be > 0".into()));
        }
        if self.universe.price_ceiling <= Decimal::ZERO {
            return Err(ScannerError::Config("universe.price_ceiling must be > 0".into()));
        }
        if d.discount_fraction <= Decimal::ZERO || d.discount_fraction >= Decimal::ONE {
            return Err(ScannerError::Config(format!(
                "detection.discount_fraction must be in (0, 1), got {}",
                d.discount_fraction
            )));
        }
        if d.bos_lookback == 0 || d.bos_exclusion == 0 || d.swing_lookback == 0 {
            return Err(ScannerError::Config(
                "detection lookback and exclusion windows must be > 0".into(),
            ));
        }
        if d.min_candles < d.bos_lookback + d.bos_exclusion {
            return Err(ScannerError::Config(format!(
                "detection.min_candles ({}) must cover bos_lookback + bos_exclusion ({})",
                d.min_candles,
                d.bos_lookback + d.bos_exclusion
            )));
        }
        let s = &self.schedule;
        if s.discovery_pacing_ms == 0 || s.recheck_pacing_ms == 0 {
            return Err(ScannerError::Config("pacing delays must be > 0".into()));
        }
        if s.call_timeout_secs == 0 || s.recheck_interval_secs == 0 {
            return Err(ScannerError::Config(
                "call_timeout_secs and recheck_interval_secs must be > 0".into(),
            ));
        }
        if s.discovery_interval_secs == Some(0) {
            return Err(ScannerError::Config("discovery_interval_secs must be > 0".into()));
        }
        if self.scanner.max_watched == 0 {
            return Err(ScannerError::Config("scanner.max_watched must be > 0".into()));
        }
        if let Some(ttl) = self.scanner.watch_ttl_secs {
            if ttl == 0 || ttl > MAX_WATCH_TTL_SECS {
                return Err(ScannerError::Config(format!(
                    "scanner.watch_ttl_secs must be in 1..={MAX_WATCH_TTL_SECS}, got {ttl}"
                )));
            }
        }
        Ok(())
    }
}
