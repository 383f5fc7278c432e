use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

use crate::api::handlers;

/// All application routes; unknown paths are served from the frontend bundle
pub fn configure_routes(static_dir: &Path) -> Router {
    let index = static_dir.join("index.html");
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // D400 AD STATS DASHBOARD
        // ========================================
        .route(
            "/api/filter-options",
            get(handlers::d400_ad_stats::get_filter_options),
        )
        .route("/api/data", get(handlers::d400_ad_stats::get_data))
        .route("/api/summary", get(handlers::d400_ad_stats::get_summary))
        .route(
            "/api/callback-distribution",
            get(handlers::d400_ad_stats::get_callback_distribution),
        )
        // ========================================
        // USECASES
        // ========================================
        .route(
            "/api/u500/aggregate",
            post(handlers::u500_aggregate_ad_stats::aggregate),
        )
        .fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
}
