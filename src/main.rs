//! SMC Sniper entry point.
//!
//! Loads configuration, initialises structured logging, wires the exchange
//! adapter and notifier into the scanner, then runs the discovery and
//! re-check tasks until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use smc_scanner::config::AppConfig;
use smc_scanner::dashboard::{self, routes::DashboardState};
use smc_scanner::engine::{
    alerts, OpportunityEvaluator, Scanner, ScheduleSettings, UniverseFilter, WatchList,
};
use smc_scanner::market::binance::BinanceClient;
use smc_scanner::market::MarketData;
use smc_scanner::notify::telegram::TelegramNotifier;
use smc_scanner::notify::{LogNotifier, Notifier};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let path = std::env::var("SCANNER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = if std::path::Path::new(&path).exists() {
        AppConfig::load(&path)?
    } else {
        warn!(path = %path, "Config file not found, using defaults");
        AppConfig::default()
    };

    info!(
        name = %cfg.scanner.name,
        mode = %cfg.scanner.mode,
        interval = %cfg.detection.interval,
        price_ceiling = %cfg.universe.price_ceiling,
        top_n = cfg.universe.top_n,
        "Scanner starting up"
    );

    // -- Initialise components -------------------------------------------

    let market: Arc<dyn MarketData> = Arc::new(
        BinanceClient::new(
            Some(&cfg.exchange.base_url),
            std::time::Duration::from_secs(cfg.exchange.http_timeout_secs),
        )
        .context("Failed to build exchange client")?,
    );

    let call_timeout = cfg.schedule.call_timeout();
    let (notifier, chat_target): (Arc<dyn Notifier>, String) =
        match cfg.alerts.telegram_credentials() {
            Some((token, chat_id)) => {
                info!("Telegram alerts enabled");
                let client = TelegramNotifier::new(token, call_timeout)
                    .context("Failed to build Telegram client")?;
                (Arc::new(client), chat_id)
            }
            None => {
                warn!(
                    token_env = %cfg.alerts.telegram_bot_token_env,
                    chat_env = %cfg.alerts.telegram_chat_id_env,
                    "No Telegram credentials configured, alerts will only be logged"
                );
                (Arc::new(LogNotifier), String::new())
            }
        };

    let evaluator =
        OpportunityEvaluator::from_detection(cfg.scanner.mode, &cfg.detection, call_timeout);
    let watchlist = Arc::new(WatchList::new(cfg.scanner.max_watched));

    let scanner = Arc::new(Scanner::new(
        market,
        notifier,
        chat_target,
        UniverseFilter::new(cfg.universe.clone()),
        evaluator,
        Arc::clone(&watchlist),
        ScheduleSettings::from_config(&cfg),
    ));

    if cfg.alerts.notify_on_startup {
        let text = alerts::startup(
            &cfg.scanner.name,
            cfg.scanner.mode,
            cfg.universe.price_ceiling,
            cfg.universe.top_n,
        );
        scanner.notify(&text).await;
    }

    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(
            Arc::new(DashboardState {
                name: cfg.scanner.name.clone(),
                watchlist,
                status: scanner.status(),
            }),
            cfg.dashboard.port,
        );
    }

    // -- Run until Ctrl+C ------------------------------------------------

    let handle = Arc::clone(&scanner).start();
    info!("Scanner running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received.");

    handle.shutdown().await;
    info!(
        watched = scanner.watchlist().len().await,
        "Scanner shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smc_scanner=info"));

    let json_logging = std::env::var("SCANNER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
