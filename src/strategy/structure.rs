//! Break-of-structure (BOS) detection.
//!
//! A bullish break holds when one of the most recent candles trades above
//! the highest high of the reference window that precedes them.

use tracing::debug;

use crate::types::{CandleSeries, StructureBreak};

/// Window sizes for the structure-break test.
#[derive(Debug, Clone)]
pub struct StructureConfig {
    /// Candles in the reference window.
    pub lookback: usize,
    /// Most recent candles kept out of the reference window; any of them
    /// trading above the reference high counts as the break.
    pub exclusion: usize,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            lookback: 50,
            exclusion: 2,
        }
    }
}

impl StructureConfig {
    /// Minimum series length the detector needs.
    pub fn required_candles(&self) -> usize {
        self.lookback + self.exclusion
    }
}

pub struct StructureBreakDetector {
    config: StructureConfig,
}

impl StructureBreakDetector {
    pub fn new(config: StructureConfig) -> Self {
        Self { config }
    }

    /// Returns the break, or `None` when there is none or the series is
    /// too short to judge.
    pub fn detect(&self, series: &CandleSeries) -> Option<StructureBreak> {
        let candles = series.candles();
        let needed = self.config.required_candles();
        if candles.len() < needed {
            debug!(
                symbol = %series.symbol,
                have = candles.len(),
                needed,
                "Too few candles for structure-break check"
            );
            return None;
        }

        let split = candles.len() - self.config.exclusion;
        let reference = &candles[split - self.config.lookback..split];
        let reference_high = reference.iter().map(|c| c.high).max()?;

        let recent = &candles[split..];
        if !recent.iter().any(|c| c.high > reference_high) {
            return None;
        }

        let last = candles.last()?;
        debug!(
            symbol = %series.symbol,
            reference_high = %reference_high,
            "Bullish structure break"
        );

        Some(StructureBreak {
            reference_price: reference_high,
            trigger_time: last.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::fixtures::{flat_series, series_from};
    use rust_decimal_macros::dec;

    fn detector() -> StructureBreakDetector {
        StructureBreakDetector::new(StructureConfig::default())
    }

    #[test]
    fn test_short_series_never_breaks() {
        for len in [0usize, 1, 10, 51] {
            let mut bars = vec![(dec!(10), dec!(9)); len];
            if let Some(last) = bars.last_mut() {
                last.0 = dec!(1000);
            }
            assert!(detector().detect(&series_from(&bars)).is_none(), "len {len}");
        }
    }

    #[test]
    fn test_last_candle_breaks_reference_high() {
        let mut bars = vec![(dec!(10), dec!(9)); 52];
        bars[20].0 = dec!(15);
        bars[51].0 = dec!(16);

        let bos = detector().detect(&series_from(&bars)).unwrap();
        assert_eq!(bos.reference_price, dec!(15));
    }

    #[test]
    fn test_second_to_last_candle_breaks() {
        let mut bars = vec![(dec!(10), dec!(9)); 60];
        bars[58].0 = dec!(11);

        let bos = detector().detect(&series_from(&bars)).unwrap();
        assert_eq!(bos.reference_price, dec!(10));
    }

    #[test]
    fn test_equal_high_is_not_a_break() {
        let bars = vec![(dec!(10), dec!(9)); 60];
        assert!(detector().detect(&series_from(&bars)).is_none());
    }

    #[test]
    fn test_candles_outside_reference_window_ignored() {
        // 100 candles: index 0..48 are older than the 50-candle window.
        let mut bars = vec![(dec!(10), dec!(9)); 100];
        bars[5].0 = dec!(50);
        bars[99].0 = dec!(12);

        let bos = detector().detect(&series_from(&bars)).unwrap();
        assert_eq!(bos.reference_price, dec!(10));
    }

    #[test]
    fn test_trigger_time_is_last_candle() {
        let mut bars = vec![(dec!(10), dec!(9)); 60];
        bars[59].0 = dec!(20);
        let series = series_from(&bars);

        let bos = detector().detect(&series).unwrap();
        assert_eq!(bos.trigger_time, series.last().unwrap().timestamp);
    }

    #[test]
    fn test_wider_exclusion_window() {
        let det = StructureBreakDetector::new(StructureConfig {
            lookback: 10,
            exclusion: 3,
        });
        let mut bars = vec![(dec!(10), dec!(9)); 13];
        bars[10].0 = dec!(11);
        assert!(det.detect(&series_from(&bars)).is_some());
        assert!(det.detect(&flat_series(12, dec!(10), dec!(9))).is_none());
    }
}
