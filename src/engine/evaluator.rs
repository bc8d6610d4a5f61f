//! Opportunity evaluation.
//!
//! Combines the structure-break and gap detectors into a single per-symbol
//! decision. Both alert modes share the detectors and differ only in the
//! acceptance predicate: instant mode also requires the last close to sit
//! inside the gap already.

use std::time::Duration;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::market::{bounded, MarketData};
use crate::strategy::{GapConfig, GapDetector, StructureBreakDetector, StructureConfig};
use crate::types::{AlertMode, CandleInterval, CandleSeries, Opportunity, ScannerError};

pub struct EvaluatorConfig {
    pub mode: AlertMode,
    pub interval: CandleInterval,
    pub min_candles: usize,
    pub discount_restricted: bool,
    pub call_timeout: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            mode: AlertMode::Deferred,
            interval: CandleInterval::OneHour,
            min_candles: 100,
            discount_restricted: true,
            call_timeout: Duration::from_secs(10),
        }
    }
}

pub struct OpportunityEvaluator {
    config: EvaluatorConfig,
    structure: StructureBreakDetector,
    gaps: GapDetector,
}

impl OpportunityEvaluator {
    pub fn new(config: EvaluatorConfig, structure: StructureBreakDetector, gaps: GapDetector) -> Self {
        Self {
            config,
            structure,
            gaps,
        }
    }

    /// Build the evaluator and its detectors from the `[detection]` section.
    pub fn from_detection(mode: AlertMode, detection: &DetectionConfig, call_timeout: Duration) -> Self {
        Self::new(
            EvaluatorConfig {
                mode,
                interval: detection.interval,
                min_candles: detection.min_candles,
                discount_restricted: detection.discount_restricted,
                call_timeout,
            },
            StructureBreakDetector::new(StructureConfig {
                lookback: detection.bos_lookback,
                exclusion: detection.bos_exclusion,
            }),
            GapDetector::new(GapConfig {
                swing_lookback: detection.swing_lookback,
                discount_fraction: detection.discount_fraction,
            }),
        )
    }

    pub fn mode(&self) -> AlertMode {
        self.config.mode
    }

    /// Fetch candles for `symbol` and decide candidacy.
    ///
    /// `Ok(None)` covers both "not enough data" and "no pattern"; `Err` is
    /// a provider fault the caller logs before moving to the next symbol.
    pub async fn evaluate(
        &self,
        market: &dyn MarketData,
        symbol: &str,
    ) -> Result<Option<Opportunity>, ScannerError> {
        let series = bounded(
            self.config.call_timeout,
            market.get_candles(symbol, self.config.interval, self.config.min_candles),
        )
        .await?;
        Ok(self.analyze(&series))
    }

    /// Pure decision over an already-fetched series.
    pub fn analyze(&self, series: &CandleSeries) -> Option<Opportunity> {
        if series.is_empty() {
            debug!(symbol = %series.symbol, "No candles returned, skipping");
            return None;
        }
        if series.len() < self.config.min_candles {
            debug!(
                symbol = %series.symbol,
                have = series.len(),
                needed = self.config.min_candles,
                "Not enough candles, skipping"
            );
            return None;
        }

        let structure_break = self.structure.detect(series)?;
        let gap = self.gaps.find_gap(series, self.config.discount_restricted)?;
        let price = series.last()?.close;

        if self.config.mode == AlertMode::Instant && !gap.contains(price) {
            debug!(
                symbol = %series.symbol,
                price = %price,
                bottom = %gap.bottom,
                top = %gap.top,
                "Price not inside gap yet"
            );
            return None;
        }

        Some(Opportunity {
            symbol: series.symbol.clone(),
            gap,
            structure_break,
            price_at_detection: price,
        })
    }
}
