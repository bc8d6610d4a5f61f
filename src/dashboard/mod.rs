//! Axum web server for operator visibility.
//!
//! Serves a health check plus read-only JSON views of the watch-list and
//! the latest pass reports. CORS enabled for local development.

pub mod routes;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use routes::AppState;

/// Start the dashboard web server.
///
/// Spawns a background task and returns immediately.
pub fn spawn_dashboard(state: AppState, port: u16) {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                error!(port, error = %e, "Failed to bind dashboard port");
                return;
            }
        };

        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Dashboard server error");
        }
    });
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::health))
        .route("/health", get(routes::health))
        .route("/api/watchlist", get(routes::get_watchlist))
        .route("/api/status", get(routes::get_status))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::engine::{ScannerStatus, WatchList};
    use crate::types::{AlertMode, WatchedEntry};
    use routes::DashboardState;

    async fn test_state() -> AppState {
        let watchlist = Arc::new(WatchList::new(5));
        watchlist
            .insert(WatchedEntry {
                symbol: "XYZUSDT".into(),
                gap_top: dec!(12),
                gap_bottom: dec!(10),
                added_at: Utc::now(),
            })
            .await
            .unwrap();
        Arc::new(DashboardState {
            name: "SMC Sniper".into(),
            watchlist,
            status: Arc::new(ScannerStatus::new(AlertMode::Deferred)),
        })
    }

    async fn get_json(uri: &str) -> serde_json::Value {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("running"));
    }

    #[tokio::test]
    async fn test_root_is_health_check() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_watchlist_endpoint() {
        let json = get_json("/api/watchlist").await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["symbol"], "XYZUSDT");
        assert_eq!(items[0]["gap_bottom"], "10");
        assert_eq!(items[0]["gap_top"], "12");
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let json = get_json("/api/status").await;
        assert_eq!(json["name"], "SMC Sniper");
        assert_eq!(json["mode"], "deferred");
        assert_eq!(json["watched"], 1);
        assert_eq!(json["capacity"], 5);
        assert_eq!(json["discovery_passes"], 0);
        assert!(json["last_discovery"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_route_404() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
