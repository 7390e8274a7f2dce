// Dashboard service - Chart window selection and history views
use crate::application::history::{HistoryPolicy, SharedHistory};
use crate::application::scheduler::PeriodControl;
use crate::domain::chart::{ChartConfig, ConfigError, MemoryEstimate, MemoryPolicy};
use crate::domain::telemetry::{Metric, Sample};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Followed polling periods never drop below the interval that
/// `ChartWarning::IntervalTooFine` flags.
pub const MIN_FOLLOWED_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesView {
    pub metric: Metric,
    pub unit: &'static str,
    pub capacity: usize,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub config: ChartConfig,
    pub estimate: MemoryEstimate,
}

#[derive(Clone)]
pub struct DashboardService {
    history: SharedHistory,
    policy: MemoryPolicy,
    history_policy: HistoryPolicy,
    active: Arc<RwLock<ChartConfig>>,
    period: Option<PeriodControl>,
}

impl DashboardService {
    pub fn new(
        history: SharedHistory,
        policy: MemoryPolicy,
        history_policy: HistoryPolicy,
        initial: ChartConfig,
    ) -> Self {
        Self {
            history,
            policy,
            history_policy,
            active: Arc::new(RwLock::new(initial)),
            period: None,
        }
    }

    /// Make the polling period track the selected chart's sample interval.
    pub fn with_period_control(mut self, control: PeriodControl) -> Self {
        self.period = Some(control);
        self
    }

    pub fn estimate(&self, config: &ChartConfig) -> MemoryEstimate {
        self.policy.estimate(config)
    }

    pub async fn active_config(&self) -> ChartConfig {
        self.active.read().await.clone()
    }

    pub async fn chart_view(&self) -> ChartView {
        let config = self.active_config().await;
        let estimate = self.estimate(&config);
        ChartView { config, estimate }
    }

    /// Switch the chart window and return exactly what was applied.
    /// Over-budget windows are still applied; the estimate says so and the
    /// warnings are logged.
    pub async fn select_config(&self, config: ChartConfig) -> ChartView {
        let estimate = self.estimate(&config);
        for warning in &estimate.warnings {
            tracing::warn!(
                label = config.duration_label(),
                max_points = config.max_points(),
                "Chart configuration warning: {}",
                warning
            );
        }

        let mut active = self.active.write().await;
        self.history
            .write()
            .await
            .apply_config(&config, self.history_policy);

        if let Some(control) = &self.period {
            let period = Duration::from_millis(config.sample_interval_ms());
            control.set(period.max(MIN_FOLLOWED_PERIOD));
        }

        tracing::info!(
            label = config.duration_label(),
            max_points = config.max_points(),
            estimated_bytes = estimate.estimated_bytes,
            within_budget = estimate.within_budget,
            "Chart configuration applied"
        );
        *active = config.clone();
        ChartView { config, estimate }
    }

    pub async fn select_preset(&self, key: &str) -> Result<ChartView, ConfigError> {
        let config = ChartConfig::preset(key)?;
        Ok(self.select_config(config).await)
    }

    pub async fn series(&self, metric: Metric) -> Option<SeriesView> {
        let history = self.history.read().await;
        history.series(metric).map(|series| SeriesView {
            metric,
            unit: metric.unit(),
            capacity: series.capacity(),
            samples: series.to_vec(),
        })
    }

    pub async fn tracked_metrics(&self) -> Vec<Metric> {
        self.history.read().await.metrics().collect()
    }
}
