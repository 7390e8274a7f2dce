// HTTP client for the device's theme endpoints
use crate::application::metric_source::FetchError;
use crate::domain::theme::{ThemeDescriptor, ThemeList, ThemePreset};
use crate::infrastructure::device_client::{DeviceClient, read_json};

#[derive(Debug, Clone)]
pub struct ThemeClient {
    device: DeviceClient,
}

impl ThemeClient {
    pub fn new(device: DeviceClient) -> Self {
        Self { device }
    }

    pub async fn current(&self) -> Result<ThemeDescriptor, FetchError> {
        let url = self.device.url("/api/themes/current");
        read_json(self.device.http().get(&url)).await
    }

    pub async fn list(&self) -> Result<Vec<String>, FetchError> {
        let url = self.device.url("/api/themes");
        let list: ThemeList = read_json(self.device.http().get(&url)).await?;
        Ok(list.themes)
    }

    pub async fn apply(&self, preset: ThemePreset) -> Result<ThemeDescriptor, FetchError> {
        let url = self.device.url(&format!(
            "/api/themes/{}",
            urlencoding::encode(preset.as_str())
        ));
        let theme: ThemeDescriptor = read_json(self.device.http().patch(&url)).await?;
        tracing::info!(theme = %theme.theme_name, "Theme applied");
        Ok(theme)
    }
}
