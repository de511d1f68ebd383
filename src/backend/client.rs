use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::backend::models::SensorReading;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Access to the plant backend over HTTP.
///
/// Call sites go through this interface instead of a patched global fetch;
/// the services (cache, stabilizer, monitor) are generic over it so tests
/// can substitute a scripted backend.
pub trait Backend: Send + Sync + 'static {
    /// GET a JSON endpoint and parse the body.
    fn get_json(&self, path: &str) -> impl Future<Output = AppResult<Value>> + Send;

    /// GET a sensor endpoint with the short sensor timeout.
    fn get_reading(&self, path: &str) -> impl Future<Output = AppResult<SensorReading>> + Send;

    /// Lightweight health-check request. Success means an OK-range status
    /// arrived within the probe timeout.
    fn probe(&self, path: &str) -> impl Future<Output = AppResult<()>> + Send;
}

pub struct BackendClient {
    http_client: Client,
    base_url: String,
    sensor_timeout: Duration,
    probe_timeout: Duration,
}

impl BackendClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            sensor_timeout: Duration::from_secs(config.sensor_timeout_seconds),
            probe_timeout: Duration::from_secs(config.probe_timeout_seconds),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Http {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

impl Backend for BackendClient {
    async fn get_json(&self, path: &str) -> AppResult<Value> {
        let response = self
            .http_client
            .get(self.url(path))
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Data(format!("Failed to parse response: {e}")))
    }

    async fn get_reading(&self, path: &str) -> AppResult<SensorReading> {
        let response = self
            .http_client
            .get(self.url(path))
            .timeout(self.sensor_timeout)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Data(format!("Failed to parse reading: {e}")))
    }

    async fn probe(&self, path: &str) -> AppResult<()> {
        let response = self
            .http_client
            .get(self.url(path))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        Self::check_status(response).await?;
        Ok(())
    }
}
