//! HTTP client for the weather backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::error::ApiError;
use crate::health::HealthClient;
use crate::types::{DailySummary, WeatherAlert, WeatherReading};

/// Default number of days requested for the historical summary.
pub const DEFAULT_SUMMARY_DAYS: u32 = 7;

/// Operations the dashboard needs from the weather backend.
///
/// Every operation performs exactly one request and reports failures as
/// tagged results; what to do with a failure is up to the caller.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Latest reading for `city`, or for every monitored city when `None`.
    async fn current_weather(&self, city: Option<&str>) -> Result<Vec<WeatherReading>, ApiError>;

    /// Daily summaries for the last `days` days, oldest first.
    async fn weather_summary(&self, city: &str, days: u32) -> Result<Vec<DailySummary>, ApiError>;

    /// Active alerts for `city`, or for every city when `None`.
    async fn alerts(&self, city: Option<&str>) -> Result<Vec<WeatherAlert>, ApiError>;

    /// Mark an alert as resolved.
    async fn resolve_alert(&self, alert_id: &str) -> Result<(), ApiError>;
}

/// reqwest-backed [`WeatherApi`]
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    base_url: Url,
}

impl WeatherClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Health prober sharing this client's connection pool.
    pub fn health(&self) -> HealthClient {
        HealthClient::from_parts(self.client.clone(), self.base_url.clone())
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: Url,
        accept_single: bool,
    ) -> Result<Vec<T>, ApiError> {
        let endpoint = url.path().to_string();
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = check_response(response).await?;
        let body = response.bytes().await?;

        decode_list(&body, &endpoint, accept_single)
    }
}

#[async_trait]
impl WeatherApi for WeatherClient {
    #[instrument(skip(self), level = "debug")]
    async fn current_weather(&self, city: Option<&str>) -> Result<Vec<WeatherReading>, ApiError> {
        let query: Vec<(&str, &str)> = city.map(|c| ("city", c)).into_iter().collect();
        let url = self.endpoint("api/weather/current", &query)?;
        self.get_list(url, true).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn weather_summary(&self, city: &str, days: u32) -> Result<Vec<DailySummary>, ApiError> {
        let days = days.to_string();
        let url = self.endpoint("api/weather/summary", &[("city", city), ("days", days.as_str())])?;
        self.get_list(url, false).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn alerts(&self, city: Option<&str>) -> Result<Vec<WeatherAlert>, ApiError> {
        let query: Vec<(&str, &str)> = city.map(|c| ("city", c)).into_iter().collect();
        let url = self.endpoint("api/alerts", &query)?;
        self.get_list(url, false).await
    }

    #[instrument(skip(self), level = "info")]
    async fn resolve_alert(&self, alert_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(
            &format!("api/alerts/{}/resolve", urlencoding::encode(alert_id)),
            &[],
        )?;
        tracing::debug!("POST {}", url);

        let response = self.client.post(url).send().await?;
        check_response(response).await?;

        tracing::info!("Resolved alert {}", alert_id);
        Ok(())
    }
}

/// Parse `base` and make sure relative joins append to its path.
pub(crate) fn normalize_base_url(base: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(base.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Turn non-2xx responses into [`ApiError::Status`].
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.canonical_reason().unwrap_or("error").to_string()
        } else {
            message
        },
    })
}

/// Decode a list body.
///
/// Invalid JSON or elements of the wrong shape are a [`ApiError::Decode`].
/// Valid JSON that is not an array yields an empty list, except that a
/// single object is accepted as a one-element list when `accept_single`.
fn decode_list<T: DeserializeOwned>(
    body: &[u8],
    endpoint: &str,
    accept_single: bool,
) -> Result<Vec<T>, ApiError> {
    let decode_err = |e: serde_json::Error| ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    };

    let value: serde_json::Value = serde_json::from_slice(body).map_err(decode_err)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(decode_err),
        serde_json::Value::Object(_) if accept_single => {
            Ok(vec![serde_json::from_value(value).map_err(decode_err)?])
        }
        other => {
            tracing::debug!(
                "{} returned a non-list body ({}), treating as empty",
                endpoint,
                kind(&other)
            );
            Ok(Vec::new())
        }
    }
}

fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
