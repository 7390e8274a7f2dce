// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::scheduler::PollStatus;
use crate::domain::readings::RoundingMode;
use crate::infrastructure::theme_client::ThemeClient;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardService,
    pub status: watch::Receiver<PollStatus>,
    pub themes: ThemeClient,
    pub rounding: RoundingMode,
}
