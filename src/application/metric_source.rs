// Source trait for device telemetry
use crate::domain::telemetry::MetricSnapshot;
use async_trait::async_trait;

/// Why a telemetry read failed. Every kind is recoverable: the poller logs
/// it, surfaces it, and tries again on the next period.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("device responded with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed payload: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::Parse(_) => "parse",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

#[async_trait]
pub trait MetricSource: Send + Sync {
    /// One read of the device. No caching: every call hits the source.
    async fn fetch(&self) -> Result<MetricSnapshot, FetchError>;
}
