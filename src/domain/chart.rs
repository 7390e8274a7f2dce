// Chart window configuration and memory policy
use serde::Serialize;
use std::fmt;

/// Hard ceiling on retained points per series, whatever the window.
pub const MAX_CHART_POINTS: usize = 10_000;

/// Timestamp + value + per-point chart bookkeeping.
pub const DEFAULT_PER_POINT_BYTES: u64 = 64;

pub const DEFAULT_MEMORY_BUDGET_BYTES: u64 = 200 * 1024;

pub const DEFAULT_LARGE_POINT_THRESHOLD: usize = 2_000;

pub const DEFAULT_PRESET: &str = "FULL_DAY";

/// (key, label, total duration in seconds, sample interval in seconds)
const PRESETS: [(&str, &str, u64, f64); 5] = [
    ("TEN_MINUTES", "10 minutes", 600, 1.0),
    ("LAST_HOUR", "1 hour", 3_600, 10.0),
    ("SIX_HOURS", "6 hours", 21_600, 60.0),
    ("HALF_DAY", "12 hours", 43_200, 60.0),
    ("FULL_DAY", "24 hours", 86_400, 60.0),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("chart duration must be greater than zero")]
    ZeroDuration,
    #[error("sample interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
    #[error("sample interval {interval}s is longer than the {duration}s window")]
    IntervalExceedsDuration { interval: f64, duration: u64 },
    #[error("{points} points exceeds the limit of {limit}")]
    TooManyPoints { points: usize, limit: usize },
    #[error("unknown chart preset: {0}")]
    UnknownPreset(String),
}

/// A chart window. Only constructible through validation, so
/// `max_points == floor(total_duration_seconds / sample_interval_seconds)`
/// and `1 <= max_points <= MAX_CHART_POINTS` always hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    duration_label: String,
    total_duration_seconds: u64,
    sample_interval_seconds: f64,
    max_points: usize,
}

impl ChartConfig {
    pub fn new(
        duration_label: impl Into<String>,
        total_duration_seconds: u64,
        sample_interval_seconds: f64,
    ) -> Result<Self, ConfigError> {
        if total_duration_seconds == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if !sample_interval_seconds.is_finite() || sample_interval_seconds <= 0.0 {
            return Err(ConfigError::InvalidInterval(sample_interval_seconds));
        }

        // The epsilon keeps ratios like 3 / 0.1 from flooring to one short.
        let ratio = total_duration_seconds as f64 / sample_interval_seconds;
        let max_points = (ratio + 1e-9).floor();
        if max_points < 1.0 {
            return Err(ConfigError::IntervalExceedsDuration {
                interval: sample_interval_seconds,
                duration: total_duration_seconds,
            });
        }
        if max_points > MAX_CHART_POINTS as f64 {
            return Err(ConfigError::TooManyPoints {
                points: max_points.min(usize::MAX as f64) as usize,
                limit: MAX_CHART_POINTS,
            });
        }

        Ok(Self {
            duration_label: duration_label.into(),
            total_duration_seconds,
            sample_interval_seconds,
            max_points: max_points as usize,
        })
    }

    pub fn preset(key: &str) -> Result<Self, ConfigError> {
        PRESETS
            .iter()
            .find(|(k, ..)| *k == key)
            .ok_or_else(|| ConfigError::UnknownPreset(key.to_string()))
            .and_then(|(_, label, duration, interval)| Self::new(*label, *duration, *interval))
    }

    /// All presets, keyed, in ascending window order.
    pub fn presets() -> Vec<(&'static str, ChartConfig)> {
        PRESETS
            .iter()
            .filter_map(|(key, label, duration, interval)| {
                Self::new(*label, *duration, *interval).ok().map(|c| (*key, c))
            })
            .collect()
    }

    pub fn duration_label(&self) -> &str {
        &self.duration_label
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.total_duration_seconds
    }

    pub fn sample_interval_seconds(&self) -> f64 {
        self.sample_interval_seconds
    }

    pub fn sample_interval_ms(&self) -> u64 {
        (self.sample_interval_seconds * 1000.0).round() as u64
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartWarning {
    IntervalTooFine,
    LargePointCount,
    ExceedsMemoryBudget,
}

impl fmt::Display for ChartWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ChartWarning::IntervalTooFine => "interval too fine for meaningful aggregation",
            ChartWarning::LargePointCount => "large point count may degrade rendering performance",
            ChartWarning::ExceedsMemoryBudget => "configuration exceeds recommended memory budget",
        };
        f.write_str(message)
    }
}

impl Serialize for ChartWarning {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEstimate {
    pub estimated_bytes: u64,
    pub within_budget: bool,
    pub warnings: Vec<ChartWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryPolicy {
    pub per_point_bytes: u64,
    pub budget_bytes: u64,
    pub large_point_threshold: usize,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            per_point_bytes: DEFAULT_PER_POINT_BYTES,
            budget_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            large_point_threshold: DEFAULT_LARGE_POINT_THRESHOLD,
        }
    }
}

impl MemoryPolicy {
    pub fn with_budget(budget_bytes: u64) -> Self {
        Self {
            budget_bytes,
            ..Self::default()
        }
    }

    pub fn estimated_bytes(&self, config: &ChartConfig) -> u64 {
        config.max_points() as u64 * self.per_point_bytes
    }

    /// Every rule is checked, in a fixed order.
    pub fn validate(&self, config: &ChartConfig) -> Vec<ChartWarning> {
        let mut warnings = Vec::new();
        if config.sample_interval_seconds() < 1.0 {
            warnings.push(ChartWarning::IntervalTooFine);
        }
        if config.max_points() > self.large_point_threshold {
            warnings.push(ChartWarning::LargePointCount);
        }
        if self.estimated_bytes(config) > self.budget_bytes {
            warnings.push(ChartWarning::ExceedsMemoryBudget);
        }
        warnings
    }

    pub fn estimate(&self, config: &ChartConfig) -> MemoryEstimate {
        let estimated_bytes = self.estimated_bytes(config);
        MemoryEstimate {
            estimated_bytes,
            within_budget: estimated_bytes <= self.budget_bytes,
            warnings: self.validate(config),
        }
    }
}

pub fn format_memory_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}
