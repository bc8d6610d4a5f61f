//! Scan scheduling for the discovery and re-check passes.
//!
//! Two periodic tasks share one watch-list:
//! - discovery: universe filter → per-symbol evaluation → watch-list insert
//!   (deferred mode) or immediate alert (instant mode);
//! - re-check (deferred mode only): live price per watched symbol →
//!   trigger alert and removal.
//!
//! Calls to the market-data provider inside a pass are sequential with a
//! pacing sleep between them. Shutdown is checked before every symbol and
//! raced against every pacing sleep, so a pass always stops between
//! symbols and never mid-mutation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::alerts;
use super::evaluator::OpportunityEvaluator;
use super::universe::UniverseFilter;
use super::watchlist::WatchList;
use crate::config::AppConfig;
use crate::market::{bounded, MarketData};
use crate::notify::{Formatting, Notifier};
use crate::types::{
    AlertMode, DiscoveryReport, MarketDataError, Opportunity, RecheckReport, ScannerError,
    WatchedEntry,
};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub discovery_interval: Duration,
    pub recheck_interval: Duration,
    pub initial_delay: Duration,
    pub discovery_pacing: Duration,
    pub recheck_pacing: Duration,
    pub call_timeout: Duration,
    pub watch_ttl: Option<chrono::Duration>,
    pub notify_on_watch: bool,
}

impl ScheduleSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let s = &cfg.schedule;
        Self {
            discovery_interval: s.discovery_interval(cfg.scanner.mode),
            recheck_interval: s.recheck_interval(),
            initial_delay: s.initial_delay(),
            discovery_pacing: s.discovery_pacing(),
            recheck_pacing: s.recheck_pacing(),
            call_timeout: s.call_timeout(),
            watch_ttl: cfg.scanner.watch_ttl(),
            notify_on_watch: cfg.alerts.notify_on_watch,
        }
    }
}

// ---------------------------------------------------------------------------
// Shutdown signal
// ---------------------------------------------------------------------------

/// Cooperative shutdown flag shared by the scan tasks.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (tx, Shutdown { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested (or the sender is gone).
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleep for `delay`. Returns `false` if shutdown arrived first.
    pub async fn pause(&mut self, delay: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        let slept = tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.triggered() => false,
        };
        slept && !self.is_triggered()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub mode: AlertMode,
    pub started_at: DateTime<Utc>,
    pub discovery_passes: u64,
    pub recheck_passes: u64,
    pub last_discovery: Option<DiscoveryReport>,
    pub last_recheck: Option<RecheckReport>,
}

/// Most recent pass reports, shared with the dashboard.
pub struct ScannerStatus {
    inner: RwLock<StatusSnapshot>,
}

impl ScannerStatus {
    pub fn new(mode: AlertMode) -> Self {
        Self {
            inner: RwLock::new(StatusSnapshot {
                mode,
                started_at: Utc::now(),
                discovery_passes: 0,
                recheck_passes: 0,
                last_discovery: None,
                last_recheck: None,
            }),
        }
    }

    pub async fn record_discovery(&self, report: DiscoveryReport) {
        let mut s = self.inner.write().await;
        s.discovery_passes += 1;
        s.last_discovery = Some(report);
    }

    pub async fn record_recheck(&self, report: RecheckReport) {
        let mut s = self.inner.write().await;
        s.recheck_passes += 1;
        s.last_recheck = Some(report);
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.clone()
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct Scanner {
    market: Arc<dyn MarketData>,
    notifier: Arc<dyn Notifier>,
    chat_target: String,
    universe: UniverseFilter,
    evaluator: OpportunityEvaluator,
    watchlist: Arc<WatchList>,
    status: Arc<ScannerStatus>,
    settings: ScheduleSettings,
}

impl Scanner {
    pub fn new(
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
        chat_target: String,
        universe: UniverseFilter,
        evaluator: OpportunityEvaluator,
        watchlist: Arc<WatchList>,
        settings: ScheduleSettings,
    ) -> Self {
        let status = Arc::new(ScannerStatus::new(evaluator.mode()));
        Self {
            market,
            notifier,
            chat_target,
            universe,
            evaluator,
            watchlist,
            status,
            settings,
        }
    }

    pub fn mode(&self) -> AlertMode {
        self.evaluator.mode()
    }

    pub fn watchlist(&self) -> Arc<WatchList> {
        Arc::clone(&self.watchlist)
    }

    pub fn status(&self) -> Arc<ScannerStatus> {
        Arc::clone(&self.status)
    }

    /// Send an alert; failures are logged and reported as `false`.
    pub async fn notify(&self, text: &str) -> bool {
        match self.notifier.send(&self.chat_target, text, Formatting::Markdown).await {
            Ok(()) => true,
            Err(e) => {
                error!(channel = self.notifier.name(), error = %e, "Alert delivery failed");
                false
            }
        }
    }

    // -- Discovery -------------------------------------------------------

    /// One full-universe discovery pass.
    pub async fn run_discovery(&self, shutdown: &mut Shutdown) -> DiscoveryReport {
        let mut report = DiscoveryReport {
            started_at: Some(Utc::now()),
            ..DiscoveryReport::default()
        };
        info!(mode = %self.mode(), "Discovery pass starting");

        let tickers = match bounded(self.settings.call_timeout, self.market.list_tickers()).await {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, "Ticker snapshot failed, skipping discovery pass");
                return report;
            }
        };

        let candidates = self.universe.select(&tickers);
        report.candidates = candidates.len();
        if candidates.is_empty() {
            warn!("No symbols matched the universe filter");
            return report;
        }

        let mut first_call = true;
        for symbol in &candidates {
            if shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }
            if self.mode() == AlertMode::Deferred && self.watchlist.contains(symbol).await {
                debug!(symbol = %symbol, "Already watched, skipping");
                report.skipped_watched += 1;
                continue;
            }
            if !first_call && !shutdown.pause(self.settings.discovery_pacing).await {
                report.interrupted = true;
                break;
            }
            first_call = false;

            match self.evaluator.evaluate(self.market.as_ref(), symbol).await {
                Ok(Some(opp)) => {
                    report.evaluated += 1;
                    report.opportunities += 1;
                    self.accept(opp, &mut report).await;
                }
                Ok(None) => report.evaluated += 1,
                Err(e) => {
                    report.failed += 1;
                    let transient = matches!(&e, ScannerError::MarketData(m) if m.is_transient());
                    error!(symbol = %symbol, error = %e, transient, "Evaluation failed, skipping symbol");
                }
            }
        }

        if report.opportunities == 0 {
            info!(%report, "Discovery pass complete, no setups found");
        } else {
            info!(%report, "Discovery pass complete");
        }
        report
    }

    /// Route an accepted opportunity per alert mode.
    async fn accept(&self, opp: Opportunity, report: &mut DiscoveryReport) {
        info!(opportunity = %opp, "Opportunity found");
        match self.mode() {
            AlertMode::Instant => {
                if self.notify(&alerts::instant_opportunity(&opp)).await {
                    report.alerts_sent += 1;
                } else {
                    report.alerts_failed += 1;
                }
            }
            AlertMode::Deferred => {
                let entry = WatchedEntry::from_opportunity(&opp, Utc::now());
                match self.watchlist.insert(entry).await {
                    Ok(()) => {
                        report.inserted += 1;
                        if self.settings.notify_on_watch {
                            if self.notify(&alerts::watch_added(&opp)).await {
                                report.alerts_sent += 1;
                            } else {
                                report.alerts_failed += 1;
                            }
                        }
                    }
                    Err(e @ ScannerError::DuplicateWatch(_)) => {
                        // Discovery skips watched symbols, so reaching this is a bug.
                        error!(symbol = %opp.symbol, error = %e, "Watch-list invariant violated");
                    }
                    Err(e) => {
                        warn!(symbol = %opp.symbol, error = %e, "Opportunity not watched");
                    }
                }
            }
        }
    }

    // -- Re-check --------------------------------------------------------

    /// One pass over the watch-list, firing entries whose gap price revisited.
    pub async fn run_recheck(&self, shutdown: &mut Shutdown) -> RecheckReport {
        let mut report = RecheckReport {
            started_at: Some(Utc::now()),
            ..RecheckReport::default()
        };

        if let Some(ttl) = self.settings.watch_ttl {
            for stale in self.watchlist.evict_older_than(ttl, Utc::now()).await {
                info!(symbol = %stale.symbol, added_at = %stale.added_at, "Evicted stale watch entry");
                report.evicted += 1;
            }
        }

        let entries = self.watchlist.snapshot().await;
        if entries.is_empty() {
            debug!("Watch-list empty, nothing to re-check");
            return report;
        }
        debug!(count = entries.len(), "Re-checking watch-list");

        for (i, entry) in entries.iter().enumerate() {
            if shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }
            if i > 0 && !shutdown.pause(self.settings.recheck_pacing).await {
                report.interrupted = true;
                break;
            }

            let price = match bounded(
                self.settings.call_timeout,
                self.market.get_current_price(&entry.symbol),
            )
            .await
            {
                Ok(p) => p,
                Err(e @ MarketDataError::UnknownSymbol(_)) => {
                    report.failed += 1;
                    warn!(symbol = %entry.symbol, error = %e, "Watched symbol unknown to provider");
                    continue;
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        symbol = %entry.symbol,
                        error = %e,
                        transient = e.is_transient(),
                        "Price check failed, entry kept"
                    );
                    continue;
                }
            };
            report.checked += 1;

            if let Some(hit) = self.watchlist.take_if_triggered(&entry.symbol, price).await {
                report.triggered += 1;
                info!(symbol = %hit.symbol, price = %price, "Entry triggered");
                if !self.notify(&alerts::entry_triggered(&hit, price)).await {
                    report.alerts_failed += 1;
                }
            }
        }

        if report.triggered > 0 || report.evicted > 0 {
            info!(%report, "Re-check pass complete");
        } else {
            debug!(%report, "Re-check pass complete");
        }
        report
    }

    // -- Task management -------------------------------------------------

    /// Spawn the periodic tasks. The re-check task only runs in deferred mode.
    pub fn start(self: Arc<Self>) -> ScannerHandle {
        let (tx, shutdown) = Shutdown::channel();
        let mut tasks = vec![tokio::spawn(Arc::clone(&self).discovery_loop(shutdown.clone()))];
        if self.mode() == AlertMode::Deferred {
            tasks.push(tokio::spawn(Arc::clone(&self).recheck_loop(shutdown)));
        }
        info!(
            mode = %self.mode(),
            discovery_secs = self.settings.discovery_interval.as_secs(),
            recheck_secs = self.settings.recheck_interval.as_secs(),
            "Scanner started"
        );
        ScannerHandle { stop_tx: tx, tasks }
    }

    async fn discovery_loop(self: Arc<Self>, mut shutdown: Shutdown) {
        if !shutdown.pause(self.settings.initial_delay).await {
            return;
        }
        let mut ticker = tokio::time::interval(self.settings.discovery_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.triggered() => break,
            }
            let report = self.run_discovery(&mut shutdown).await;
            self.status.record_discovery(report).await;
            if shutdown.is_triggered() {
                break;
            }
        }
        info!("Discovery task stopped");
    }

    async fn recheck_loop(self: Arc<Self>, mut shutdown: Shutdown) {
        let period = self.settings.recheck_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.triggered() => break,
            }
            let report = self.run_recheck(&mut shutdown).await;
            self.status.record_recheck(report).await;
            if shutdown.is_triggered() {
                break;
            }
        }
        info!("Re-check task stopped");
    }
}

/// Running scan tasks.
pub struct ScannerHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ScannerHandle {
    /// Ask both tasks to stop after their current symbol and wait for them.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Scan task ended abnormally");
            }
        }
    }
}
