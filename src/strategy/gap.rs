//! Fair-value gap (FVG) detection and the discount zone.
//!
//! A bullish gap is the three-candle imbalance where the low of candle
//! `i+1` sits above the high of candle `i-1`. It stays valid until a later
//! candle trades back down to the gap's bottom.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::{Candle, CandleSeries, PriceGap};

#[derive(Debug, Clone)]
pub struct GapConfig {
    /// Candles in the trailing swing used for the discount threshold.
    pub swing_lookback: usize,
    /// Fraction of the swing range above the swing low that bounds the
    /// discount zone.
    pub discount_fraction: Decimal,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            swing_lookback: 50,
            discount_fraction: dec!(0.5),
        }
    }
}

/// `swing_low + fraction * (swing_high - swing_low)`.
pub fn discount_threshold(swing_low: Decimal, swing_high: Decimal, fraction: Decimal) -> Decimal {
    swing_low + fraction * (swing_high - swing_low)
}

pub struct GapDetector {
    config: GapConfig,
}

impl GapDetector {
    pub fn new(config: GapConfig) -> Self {
        Self { config }
    }

    /// Discount threshold over the trailing swing, `None` on an empty series.
    pub fn discount_threshold(&self, series: &CandleSeries) -> Option<Decimal> {
        let swing = series.tail(self.config.swing_lookback);
        let low = swing.iter().map(|c| c.low).min()?;
        let high = swing.iter().map(|c| c.high).max()?;
        Some(discount_threshold(low, high, self.config.discount_fraction))
    }

    /// Most recent unfilled bullish gap.
    ///
    /// With `discount_restricted`, that gap must also have its top strictly
    /// below the discount threshold; otherwise there is no gap. Older gaps
    /// are never considered in its place.
    pub fn find_gap(&self, series: &CandleSeries, discount_restricted: bool) -> Option<PriceGap> {
        let candles = series.candles();
        if candles.len() < 4 {
            return None;
        }

        let gap = (1..=candles.len() - 3)
            .rev()
            .filter_map(|i| gap_at(candles, i).map(|gap| (i, gap)))
            .find(|(i, gap)| !is_filled(candles, *i, gap.bottom))
            .map(|(_, gap)| gap)?;

        if discount_restricted {
            let limit = self.discount_threshold(series)?;
            if gap.top >= limit {
                debug!(
                    symbol = %series.symbol,
                    gap_top = %gap.top,
                    threshold = %limit,
                    "Most recent unfilled gap above discount zone"
                );
                return None;
            }
        }

        debug!(
            symbol = %series.symbol,
            bottom = %gap.bottom,
            top = %gap.top,
            "Unfilled bullish gap"
        );
        Some(gap)
    }
}

/// Gap whose middle candle is `i`, if `candles[i-1].high < candles[i+1].low`.
fn gap_at(candles: &[Candle], i: usize) -> Option<PriceGap> {
    let before = &candles[i - 1];
    let after = &candles[i + 1];
    if before.high < after.low {
        Some(PriceGap {
            top: after.low,
            bottom: before.high,
            created_at: after.timestamp,
        })
    } else {
        None
    }
}

/// Whether any candle after `i+1` traded down to `bottom`.
fn is_filled(candles: &[Candle], i: usize, bottom: Decimal) -> bool {
    candles[i + 2..].iter().any(|c| c.low <= bottom)
}
