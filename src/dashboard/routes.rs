//! Dashboard API route handlers.
//!
//! All endpoints are read-only. State is shared via `Arc<DashboardState>`.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::{ScannerStatus, StatusSnapshot, WatchList};
use crate::types::WatchedEntry;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct DashboardState {
    pub name: String,
    pub watchlist: Arc<WatchList>,
    pub status: Arc<ScannerStatus>,
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub watched: usize,
    pub capacity: usize,
    pub uptime_secs: i64,
    #[serde(flatten)]
    pub scanner: StatusSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchlistItem {
    pub symbol: String,
    pub gap_bottom: String,
    pub gap_top: String,
    pub added_at: DateTime<Utc>,
}

impl From<WatchedEntry> for WatchlistItem {
    fn from(e: WatchedEntry) -> Self {
        Self {
            symbol: e.symbol,
            gap_bottom: e.gap_bottom.to_string(),
            gap_top: e.gap_top.to_string(),
            added_at: e.added_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health(State(state): State<AppState>) -> String {
    format!("{} scanner is running", state.name)
}

/// GET /api/watchlist
pub async fn get_watchlist(State(state): State<AppState>) -> Json<Vec<WatchlistItem>> {
    let entries = state.watchlist.snapshot().await;
    Json(entries.into_iter().map(WatchlistItem::from).collect())
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let scanner = state.status.snapshot().await;
    let uptime = (Utc::now() - scanner.started_at).num_seconds();
    Json(StatusResponse {
        name: state.name.clone(),
        watched: state.watchlist.len().await,
        capacity: state.watchlist.capacity(),
        uptime_secs: uptime,
        scanner,
    })
}
