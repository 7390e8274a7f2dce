// Polling scheduler - Periodic telemetry reads feeding the chart history
use crate::application::history::SharedHistory;
use crate::application::metric_source::MetricSource;
use crate::domain::telemetry::MetricSnapshot;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PollPhase {
    /// Started, no tick has fired yet.
    #[default]
    Idle,
    Fetching,
    /// Last fetch succeeded; held until the next tick.
    Success,
    /// Last fetch failed; held until the next tick.
    Failed,
    Stopped,
}

/// What observers see. `completed_ticks` never decreases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatus {
    pub phase: PollPhase,
    pub latest: Option<MetricSnapshot>,
    pub last_error: Option<String>,
    pub completed_ticks: u64,
    pub consecutive_failures: u32,
    pub last_success_ms: Option<i64>,
}

impl PollStatus {
    pub fn is_loading(&self) -> bool {
        self.latest.is_none() && self.last_error.is_none()
    }
}

/// Handle for changing the polling period of a running scheduler.
#[derive(Clone)]
pub struct PeriodControl {
    tx: Arc<watch::Sender<Duration>>,
}

impl PeriodControl {
    pub fn set(&self, period: Duration) {
        let period = period.max(MIN_POLL_INTERVAL);
        self.tx.send_if_modified(|current| {
            if *current == period {
                false
            } else {
                *current = period;
                true
            }
        });
    }

    pub fn get(&self) -> Duration {
        *self.tx.borrow()
    }
}

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Polls a [`MetricSource`] on a fixed period.
///
/// The loop awaits each fetch before waiting for the next tick, so two
/// fetches never overlap. Ticks that fall due while a fetch is in flight
/// collapse into one tick that fires as soon as the fetch resolves; later
/// ticks stay on the period grid. Failures never stop the loop.
pub struct PollingScheduler {
    source: Arc<dyn MetricSource>,
    history: SharedHistory,
    status_tx: Arc<watch::Sender<PollStatus>>,
    period_tx: Arc<watch::Sender<Duration>>,
    running: Option<Running>,
}

impl PollingScheduler {
    pub fn new(source: Arc<dyn MetricSource>, history: SharedHistory, period: Duration) -> Self {
        let (status_tx, _) = watch::channel(PollStatus::default());
        let (period_tx, _) = watch::channel(period.max(MIN_POLL_INTERVAL));
        Self {
            source,
            history,
            status_tx: Arc::new(status_tx),
            period_tx: Arc::new(period_tx),
            running: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> PollStatus {
        self.status_tx.borrow().clone()
    }

    pub fn period_control(&self) -> PeriodControl {
        PeriodControl {
            tx: self.period_tx.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    pub fn start(&mut self) {
        if self.is_running() {
            tracing::warn!("Polling scheduler already running");
            return;
        }

        let token = CancellationToken::new();
        self.status_tx.send_modify(|status| status.phase = PollPhase::Idle);

        let poller = Poller {
            source: self.source.clone(),
            history: self.history.clone(),
            status_tx: self.status_tx.clone(),
            period_rx: self.period_tx.subscribe(),
            _period_tx: self.period_tx.clone(),
            token: token.clone(),
        };
        let handle = tokio::spawn(poller.run());

        tracing::info!(
            period_ms = self.period_control().get().as_millis() as u64,
            "Polling scheduler started"
        );
        self.running = Some(Running { token, handle });
    }

    /// Cancels the loop, including an in-flight fetch, and waits for the
    /// task to finish. No tick fires after this returns.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.token.cancel();
        if let Err(e) = running.handle.await {
            tracing::error!("Polling task ended abnormally: {}", e);
        }
        self.status_tx.send_modify(|status| status.phase = PollPhase::Stopped);
        tracing::info!("Polling scheduler stopped");
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.token.cancel();
        }
    }
}

struct Poller {
    source: Arc<dyn MetricSource>,
    history: SharedHistory,
    status_tx: Arc<watch::Sender<PollStatus>>,
    period_rx: watch::Receiver<Duration>,
    // Keeps the period channel open for as long as the task runs.
    _period_tx: Arc<watch::Sender<Duration>>,
    token: CancellationToken,
}

impl Poller {
    async fn run(mut self) {
        let period = *self.period_rx.borrow_and_update();
        let mut ticker = new_ticker(Instant::now(), period);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                changed = self.period_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let period = *self.period_rx.borrow_and_update();
                    tracing::info!(period_ms = period.as_millis() as u64, "Polling period changed");
                    ticker = new_ticker(Instant::now() + period, period);
                    continue;
                }
                _ = ticker.tick() => {}
            }

            self.status_tx.send_modify(|status| status.phase = PollPhase::Fetching);

            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.source.fetch() => result,
            };

            match result {
                Ok(snapshot) => {
                    // History first, so an observer of tick n also sees its samples.
                    self.history.write().await.record(&snapshot);
                    tracing::debug!(captured_at_ms = snapshot.captured_at_ms, "Telemetry recorded");
                    self.status_tx.send_modify(|status| {
                        status.phase = PollPhase::Success;
                        status.last_error = None;
                        status.consecutive_failures = 0;
                        status.last_success_ms = Some(snapshot.captured_at_ms);
                        status.latest = Some(snapshot);
                        status.completed_ticks += 1;
                    });
                }
                Err(e) => {
                    tracing::warn!(kind = e.kind(), "Telemetry fetch failed: {}", e);
                    self.status_tx.send_modify(|status| {
                        status.phase = PollPhase::Failed;
                        status.last_error = Some(e.to_string());
                        status.consecutive_failures += 1;
                        status.completed_ticks += 1;
                    });
                }
            }
        }
    }
}

fn new_ticker(start: Instant, period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(start, period.max(MIN_POLL_INTERVAL));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::history::MetricHistory;
    use crate::application::metric_source::FetchError;
    use crate::domain::telemetry::Metric;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(hash_rate: f64) -> MetricSnapshot {
        let body = format!(r#"{{"hashRate": {hash_rate}, "temp": 55, "power": 14}}"#);
        MetricSnapshot::from_json(&body, hash_rate as i64).unwrap()
    }

    /// Replays scripted results, then keeps succeeding.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<MetricSnapshot, FetchError>>>,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        started_at: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<MetricSnapshot, FetchError>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                started_at: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetricSource for ScriptedSource {
        async fn fetch(&self) -> Result<MetricSnapshot, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.started_at.lock().unwrap().push(Instant::now());
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(snapshot(100.0 + call as f64)))
        }
    }

    fn scheduler(source: Arc<ScriptedSource>, period: Duration) -> (PollingScheduler, SharedHistory) {
        let history = MetricHistory::new(&[Metric::HashRate], 10).shared();
        (PollingScheduler::new(source, history.clone(), period), history)
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_keeps_history_and_retries_next_period() {
        let source = ScriptedSource::new(
            vec![
                Ok(snapshot(1.0)),
                Err(FetchError::HttpStatus { status: 500, body: "boom".to_string() }),
                Ok(snapshot(3.0)),
            ],
            Duration::ZERO,
        );
        let (mut scheduler, history) = scheduler(source.clone(), Duration::from_secs(10));
        let mut rx = scheduler.subscribe();
        scheduler.start();

        let status = rx.wait_for(|s| s.completed_ticks == 1).await.unwrap().clone();
        assert_eq!(status.phase, PollPhase::Success);

        let status = rx.wait_for(|s| s.completed_ticks == 2).await.unwrap().clone();
        let failed_at = Instant::now();
        assert_eq!(status.phase, PollPhase::Failed);
        assert!(status.last_error.as_deref().unwrap().contains("500"));
        assert_eq!(status.consecutive_failures, 1);
        assert_eq!(status.latest.as_ref().unwrap().hash_rate, 1.0);
        {
            let history = history.read().await;
            let series = history.series(Metric::HashRate).unwrap();
            assert_eq!(series.to_vec().len(), 1);
            assert_eq!(series.latest().unwrap().value, 1.0);
        }

        let status = rx.wait_for(|s| s.completed_ticks == 3).await.unwrap().clone();
        let elapsed = failed_at.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
        assert_eq!(status.phase, PollPhase::Success);
        assert_eq!(status.last_error, None);
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(history.read().await.series(Metric::HashRate).unwrap().len(), 2);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetches_never_overlap() {
        let source = ScriptedSource::new(Vec::new(), Duration::from_secs(25));
        let (mut scheduler, _history) = scheduler(source.clone(), Duration::from_secs(10));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(90)).await;
        scheduler.stop().await;

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        // Overdue ticks collapse: fetches start back to back at 0, 25, 50, 75.
        assert_eq!(source.calls(), 4);
        let starts = source.started_at.lock().unwrap().clone();
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(25));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let source = ScriptedSource::new(Vec::new(), Duration::ZERO);
        let (mut scheduler, _history) = scheduler(source.clone(), Duration::from_secs(10));
        let mut rx = scheduler.subscribe();
        scheduler.start();
        assert!(scheduler.is_running());

        rx.wait_for(|s| s.completed_ticks == 2).await.unwrap();
        scheduler.stop().await;
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.status().phase, PollPhase::Stopped);

        let calls = source.calls();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.calls(), calls);
        assert_eq!(scheduler.status().completed_ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_in_flight_fetch() {
        let source = ScriptedSource::new(Vec::new(), Duration::from_secs(60));
        let (mut scheduler, history) = scheduler(source.clone(), Duration::from_secs(10));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(scheduler.status().phase, PollPhase::Fetching);
        scheduler.stop().await;

        assert_eq!(scheduler.status().completed_ticks, 0);
        assert!(history.read().await.series(Metric::HashRate).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_period_change_rearms_timer() {
        let source = ScriptedSource::new(Vec::new(), Duration::ZERO);
        let (mut scheduler, _history) = scheduler(source.clone(), Duration::from_secs(60));
        let mut rx = scheduler.subscribe();
        let control = scheduler.period_control();
        scheduler.start();

        rx.wait_for(|s| s.completed_ticks == 1).await.unwrap();
        let changed_at = Instant::now();
        control.set(Duration::from_secs(2));
        assert_eq!(control.get(), Duration::from_secs(2));

        rx.wait_for(|s| s.completed_ticks == 3).await.unwrap();
        let elapsed = changed_at.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_a_no_op() {
        let source = ScriptedSource::new(Vec::new(), Duration::ZERO);
        let (mut scheduler, _history) = scheduler(source.clone(), Duration::from_secs(10));
        let mut rx = scheduler.subscribe();
        assert!(scheduler.status().is_loading());

        scheduler.start();
        scheduler.start();
        rx.wait_for(|s| s.completed_ticks == 1).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);

        scheduler.stop().await;
    }
}
