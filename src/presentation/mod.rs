// Presentation layer - HTTP surface over dashboard state
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    apply_theme, get_chart, get_readings, get_series, get_status, get_theme, health_check,
    list_presets, list_themes, select_custom_chart, select_preset, stream_status,
};
use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/status", get(get_status))
        .route("/api/readings", get(get_readings))
        .route("/api/events", get(stream_status))
        .route("/api/series/:metric", get(get_series))
        .route("/api/chart", get(get_chart).post(select_custom_chart))
        .route("/api/chart/presets", get(list_presets))
        .route("/api/chart/presets/:key", put(select_preset))
        .route("/api/themes", get(list_themes))
        .route("/api/themes/:name", get(get_theme).patch(apply_theme))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
