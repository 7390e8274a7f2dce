use crate::application::history::HistoryPolicy;
use crate::application::scheduler::DEFAULT_POLL_INTERVAL;
use crate::domain::chart::{
    ChartConfig, ConfigError, DEFAULT_MEMORY_BUDGET_BYTES, DEFAULT_PRESET, MemoryPolicy,
};
use crate::domain::readings::RoundingMode;
use crate::domain::telemetry::Metric;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::time::Duration;

pub const CONFIG_FILE: &str = "config/dashboard";
pub const ENV_PREFIX: &str = "MINER_DASH";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub device: DeviceSettings,
    pub polling: PollingSettings,
    pub chart: ChartSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    pub interval_ms: u64,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    pub preset: String,
    pub history_policy: HistoryPolicy,
    pub follow_chart_interval: bool,
    pub memory_budget_bytes: u64,
    pub rounding: RoundingMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.device.request_timeout_ms)
    }

    pub fn initial_chart(&self) -> Result<ChartConfig, ConfigError> {
        ChartConfig::preset(&self.chart.preset)
    }

    pub fn memory_policy(&self) -> MemoryPolicy {
        MemoryPolicy::with_budget(self.chart.memory_budget_bytes)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.polling.interval_ms == 0 {
            anyhow::bail!("polling.interval_ms must be greater than zero");
        }
        if self.polling.metrics.is_empty() {
            anyhow::bail!("polling.metrics must name at least one metric");
        }
        self.initial_chart()?;
        Ok(())
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("device.base_url", "http://192.168.4.1")?
        .set_default("device.request_timeout_ms", 5_000)?
        .set_default("polling.interval_ms", DEFAULT_POLL_INTERVAL.as_millis() as u64)?
        .set_default("polling.metrics", vec!["hash-rate", "temperature", "power"])?
        .set_default("chart.preset", DEFAULT_PRESET)?
        .set_default("chart.history_policy", "truncate")?
        .set_default("chart.follow_chart_interval", false)?
        .set_default("chart.memory_budget_bytes", DEFAULT_MEMORY_BUDGET_BYTES)?
        .set_default("chart.rounding", "half-up")?
        .set_default("server.listen_addr", "0.0.0.0:8080")
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("polling.metrics")
        .try_parsing(true)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    let app_config: AppConfig = builder.build()?.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Defaults, then `config/dashboard.{toml,json,...}` if present, then
/// `MINER_DASH_*` environment variables (`__` separates sections).
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    finish(
        defaults()?
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(environment()),
    )
}

pub fn load_app_config_from_toml(toml: &str) -> anyhow::Result<AppConfig> {
    finish(defaults()?.add_source(config::File::from_str(toml, config::FileFormat::Toml)))
}
