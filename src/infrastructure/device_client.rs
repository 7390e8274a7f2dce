// HTTP client for the device's telemetry endpoint
use crate::application::metric_source::{FetchError, MetricSource};
use crate::domain::telemetry::{DeviceInfo, MetricSnapshot};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const SYSTEM_INFO_PATH: &str = "/api/system/info";

#[derive(Debug, Clone)]
pub struct DeviceClient {
    base_url: String,
    client: reqwest::Client,
}

impl DeviceClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MetricSource for DeviceClient {
    async fn fetch(&self) -> Result<MetricSnapshot, FetchError> {
        let url = self.url(SYSTEM_INFO_PATH);
        let request = self.client.get(&url).header("Accept", "application/json");
        let info: DeviceInfo = read_json(request).await?;
        let captured_at_ms = chrono::Utc::now().timestamp_millis();
        Ok(MetricSnapshot::from_device_info(info, captured_at_ms))
    }
}

/// Send a request and decode a JSON body, classifying every failure.
pub(crate) async fn read_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    Ok(serde_json::from_str(&body)?)
}
