// HTTP request handlers
use crate::application::dashboard_service::{ChartView, SeriesView};
use crate::application::metric_source::FetchError;
use crate::application::scheduler::PollStatus;
use crate::domain::chart::{ChartConfig, ConfigError, MemoryEstimate};
use crate::domain::readings::Readings;
use crate::domain::telemetry::{Metric, UnknownMetric};
use crate::domain::theme::{ThemeDescriptor, ThemeList, ThemeParseError, ThemePreset};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unavailable(String),
    Upstream(FetchError),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownPreset(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            ApiError::Upstream(e) => {
                tracing::warn!(kind = e.kind(), "Device request failed: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomChartRequest {
    pub duration_label: Option<String>,
    pub total_duration_seconds: u64,
    pub sample_interval_seconds: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetView {
    pub key: &'static str,
    pub config: ChartConfig,
    pub estimate: MemoryEstimate,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<PollStatus> {
    Json(state.status.borrow().clone())
}

/// Latest snapshot, converted and rounded for display
pub async fn get_readings(State(state): State<Arc<AppState>>) -> Result<Json<Readings>, ApiError> {
    let status = state.status.borrow().clone();
    match status.latest {
        Some(snapshot) => Ok(Json(Readings::from_snapshot(&snapshot, state.rounding))),
        None => Err(ApiError::Unavailable(
            status
                .last_error
                .unwrap_or_else(|| "no telemetry received yet".to_string()),
        )),
    }
}

pub async fn get_series(
    Path(metric): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesView>, ApiError> {
    let metric: Metric = metric
        .parse()
        .map_err(|e: UnknownMetric| ApiError::NotFound(e.to_string()))?;
    state
        .dashboard
        .series(metric)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("metric not tracked: {metric}")))
}

pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<ChartView> {
    Json(state.dashboard.chart_view().await)
}

pub async fn list_presets(State(state): State<Arc<AppState>>) -> Json<Vec<PresetView>> {
    let presets = ChartConfig::presets()
        .into_iter()
        .map(|(key, config)| PresetView {
            key,
            estimate: state.dashboard.estimate(&config),
            config,
        })
        .collect();
    Json(presets)
}

pub async fn select_preset(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartView>, ApiError> {
    let applied = state.dashboard.select_preset(&key).await?;
    Ok(Json(applied))
}

pub async fn select_custom_chart(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CustomChartRequest>,
) -> Result<Json<ChartView>, ApiError> {
    let label = request
        .duration_label
        .unwrap_or_else(|| format!("{}s", request.total_duration_seconds));
    let config = ChartConfig::new(
        label,
        request.total_duration_seconds,
        request.sample_interval_seconds,
    )?;
    Ok(Json(state.dashboard.select_config(config).await))
}

/// Status updates as server-sent events, newest value first
pub async fn stream_status(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.status.clone();
    let stream = async_stream::stream! {
        loop {
            let status = rx.borrow_and_update().clone();
            match Event::default().event("status").json_data(&status) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(e) => tracing::warn!("Failed to encode status event: {}", e),
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn list_themes(State(state): State<Arc<AppState>>) -> Result<Json<ThemeList>, ApiError> {
    let themes = state.themes.list().await.map_err(ApiError::Upstream)?;
    Ok(Json(ThemeList { themes }))
}

/// Only `current` is readable; any other name is a PATCH target.
pub async fn get_theme(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ThemeDescriptor>, ApiError> {
    if name != "current" {
        return Err(ApiError::NotFound(format!("no such theme resource: {name}")));
    }
    let theme = state.themes.current().await.map_err(ApiError::Upstream)?;
    Ok(Json(theme))
}

pub async fn apply_theme(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ThemeDescriptor>, ApiError> {
    let preset: ThemePreset = name
        .parse()
        .map_err(|e: ThemeParseError| ApiError::BadRequest(e.to_string()))?;
    let theme = state.themes.apply(preset).await.map_err(ApiError::Upstream)?;
    Ok(Json(theme))
}
