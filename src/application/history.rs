// Per-metric chart history
use crate::domain::chart::ChartConfig;
use crate::domain::series::Series;
use crate::domain::telemetry::{Metric, MetricSnapshot, Sample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedHistory = Arc<RwLock<MetricHistory>>;

/// What happens to buffered samples when the chart window changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryPolicy {
    /// Keep samples as they are; a smaller window drops the oldest.
    #[default]
    Truncate,
    /// Start every series over.
    Discard,
    /// Average existing samples into buckets of the new interval, then trim.
    Resample,
}

#[derive(Debug, Clone)]
pub struct MetricHistory {
    series: BTreeMap<Metric, Series>,
}

impl MetricHistory {
    pub fn new(metrics: &[Metric], capacity: usize) -> Self {
        let series = metrics
            .iter()
            .map(|metric| (*metric, Series::new(capacity)))
            .collect();
        Self { series }
    }

    pub fn shared(self) -> SharedHistory {
        Arc::new(RwLock::new(self))
    }

    /// Append one sample per tracked metric, stamped with the capture time.
    pub fn record(&mut self, snapshot: &MetricSnapshot) {
        for (metric, series) in self.series.iter_mut() {
            series.append(metric.sample(snapshot));
        }
    }

    pub fn series(&self, metric: Metric) -> Option<&Series> {
        self.series.get(&metric)
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.series.keys().copied()
    }

    pub fn apply_config(&mut self, config: &ChartConfig, policy: HistoryPolicy) {
        let capacity = config.max_points();
        let bucket_ms = config.sample_interval_ms().max(1) as i64;

        for series in self.series.values_mut() {
            match policy {
                HistoryPolicy::Truncate => series.set_capacity(capacity),
                HistoryPolicy::Discard => {
                    series.clear();
                    series.set_capacity(capacity);
                }
                HistoryPolicy::Resample => {
                    let resampled = resample(&series.to_vec(), bucket_ms);
                    series.set_capacity(capacity);
                    series.replace(resampled);
                }
            }
        }
    }
}

/// Bucket averaging over interval-aligned windows. Each bucket keeps its
/// middle sample's timestamp so the output stays in time order.
pub fn resample(samples: &[Sample], bucket_ms: i64) -> Vec<Sample> {
    let mut resampled = Vec::new();
    let mut start = 0;

    while start < samples.len() {
        let bucket = samples[start].timestamp_ms.div_euclid(bucket_ms);
        let mut end = start + 1;
        while end < samples.len() && samples[end].timestamp_ms.div_euclid(bucket_ms) == bucket {
            end += 1;
        }

        let chunk = &samples[start..end];
        let mid_idx = chunk.len() / 2;
        let avg_value = chunk.iter().map(|s| s.value).sum::<f64>() / chunk.len() as f64;
        resampled.push(Sample::new(chunk[mid_idx].timestamp_ms, avg_value));

        start = end;
    }

    resampled
}
