// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use miner_dashboard::application::dashboard_service::DashboardService;
use miner_dashboard::application::history::MetricHistory;
use miner_dashboard::application::scheduler::PollingScheduler;
use miner_dashboard::domain::chart::format_memory_size;
use miner_dashboard::infrastructure::config::load_app_config;
use miner_dashboard::infrastructure::device_client::DeviceClient;
use miner_dashboard::infrastructure::theme_client::ThemeClient;
use miner_dashboard::presentation::app_state::AppState;
use miner_dashboard::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let app_config = load_app_config()?;
    let chart = app_config.initial_chart()?;
    let policy = app_config.memory_policy();

    // Device adapters (infrastructure layer)
    let device = DeviceClient::new(&app_config.device.base_url, app_config.request_timeout())?;
    let themes = ThemeClient::new(device.clone());

    // History, scheduler and services (application layer)
    let history = MetricHistory::new(&app_config.polling.metrics, chart.max_points()).shared();
    let mut scheduler =
        PollingScheduler::new(Arc::new(device), history.clone(), app_config.poll_interval());

    let mut dashboard = DashboardService::new(
        history,
        policy,
        app_config.chart.history_policy,
        chart.clone(),
    );
    if app_config.chart.follow_chart_interval {
        dashboard = dashboard.with_period_control(scheduler.period_control());
    }
    let applied = dashboard.select_config(chart).await;
    tracing::info!(
        estimated = %format_memory_size(applied.estimate.estimated_bytes),
        "Initial chart memory estimate"
    );

    let state = Arc::new(AppState {
        dashboard,
        status: scheduler.subscribe(),
        themes,
        rounding: app_config.chart.rounding,
    });

    scheduler.start();

    // Start server
    let addr: SocketAddr = app_config.server.listen_addr.parse()?;
    tracing::info!(device = %app_config.device.base_url, "Starting miner-dashboard on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    scheduler.stop().await;
    Ok(())
}
