//! Universe selection.
//!
//! Narrows the exchange-wide ticker snapshot to the symbols worth scanning:
//! stable-quoted, not a leveraged token, under the price ceiling, ranked
//! by quote volume.

use tracing::{debug, info};

use crate::config::UniverseConfig;
use crate::types::Ticker;

pub struct UniverseFilter {
    config: UniverseConfig,
}

impl UniverseFilter {
    pub fn new(config: UniverseConfig) -> Self {
        Self { config }
    }

    /// Candidate symbols, highest quote volume first.
    ///
    /// Entries missing a price or volume are skipped; an empty snapshot
    /// yields an empty list.
    pub fn select(&self, tickers: &[Ticker]) -> Vec<String> {
        let mut skipped_malformed = 0usize;

        let mut eligible: Vec<_> = tickers
            .iter()
            .filter(|t| self.is_spot_pair(&t.symbol))
            .filter_map(|t| match (t.last_price, t.quote_volume) {
                (Some(price), Some(volume)) => Some((t, price, volume)),
                _ => {
                    skipped_malformed += 1;
                    None
                }
            })
            .filter(|(_, price, _)| *price < self.config.price_ceiling)
            .collect();

        eligible.sort_by(|a, b| b.2.cmp(&a.2));
        eligible.truncate(self.config.top_n);

        if skipped_malformed > 0 {
            debug!(count = skipped_malformed, "Skipped tickers without price or volume");
        }
        info!(
            snapshot = tickers.len(),
            selected = eligible.len(),
            price_ceiling = %self.config.price_ceiling,
            top_n = self.config.top_n,
            "Universe selected"
        );

        eligible.into_iter().map(|(t, _, _)| t.symbol.clone()).collect()
    }

    fn is_spot_pair(&self, symbol: &str) -> bool {
        symbol.ends_with(&self.config.quote_suffix)
            && !self
                .config
                .excluded_markers
                .iter()
                .any(|marker| symbol.contains(marker.as_str()))
    }
}
