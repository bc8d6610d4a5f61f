//! Watch-list of accepted opportunities awaiting a price re-entry.
//!
//! Per-symbol lifecycle: Absent → Watched → Triggered (entry removed, the
//! symbol is Absent again). Entries are keyed by symbol, so at most one
//! entry per symbol exists. Every read-modify-write runs under one lock,
//! which is what keeps the discovery and re-check tasks from racing on
//! the same symbol.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::types::{ScannerError, WatchedEntry};

pub struct WatchList {
    entries: Mutex<HashMap<String, WatchedEntry>>,
    capacity: usize,
}

impl WatchList {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn contains(&self, symbol: &str) -> bool {
        self.entries.lock().await.contains_key(symbol)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Absent → Watched.
    ///
    /// Fails without touching the list if the symbol is already watched or
    /// the list is at capacity.
    pub async fn insert(&self, entry: WatchedEntry) -> Result<(), ScannerError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&entry.symbol) {
            return Err(ScannerError::DuplicateWatch(entry.symbol));
        }
        if entries.len() >= self.capacity {
            return Err(ScannerError::WatchListFull(self.capacity));
        }
        info!(
            symbol = %entry.symbol,
            gap_bottom = %entry.gap_bottom,
            gap_top = %entry.gap_top,
            "Added to watch-list"
        );
        entries.insert(entry.symbol.clone(), entry);
        Ok(())
    }

    /// Watched → Triggered.
    ///
    /// Removes and returns the entry only if it is still present and
    /// `price` lies inside its gap.
    pub async fn take_if_triggered(&self, symbol: &str, price: Decimal) -> Option<WatchedEntry> {
        let mut entries = self.entries.lock().await;
        let triggered = entries.get(symbol)?.is_triggered_by(price);
        if !triggered {
            debug!(symbol, price = %price, "Price outside gap");
            return None;
        }
        entries.remove(symbol)
    }

    /// Drop entries added more than `ttl` before `now`, returning them.
    ///
    /// A cutoff outside the representable date range evicts nothing.
    pub async fn evict_older_than(&self, ttl: Duration, now: DateTime<Utc>) -> Vec<WatchedEntry> {
        let Some(cutoff) = now.checked_sub_signed(ttl) else {
            return Vec::new();
        };
        let mut entries = self.entries.lock().await;
        let stale: Vec<String> = entries
            .values()
            .filter(|e| e.added_at < cutoff)
            .map(|e| e.symbol.clone())
            .collect();
        let mut evicted: Vec<WatchedEntry> =
            stale.iter().filter_map(|symbol| entries.remove(symbol)).collect();
        evicted.sort_by(|a, b| a.added_at.cmp(&b.added_at));
        evicted
    }

    /// Read-only copy of the current entries, oldest first.
    pub async fn snapshot(&self) -> Vec<WatchedEntry> {
        let entries = self.entries.lock().await;
        let mut list: Vec<WatchedEntry> = entries.values().cloned().collect();
        list.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.symbol.cmp(&b.symbol)));
        list
    }
}
