//! Backend reachability probes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::client::{check_response, normalize_base_url};
use crate::error::ApiError;
use crate::types::HealthReport;

/// Which of the dashboard's endpoints answered with a 2xx
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndpointStatus {
    pub health: bool,
    pub weather: bool,
    pub summary: bool,
    pub alerts: bool,
}

impl EndpointStatus {
    pub fn all_ok(&self) -> bool {
        self.health && self.weather && self.summary && self.alerts
    }
}

#[derive(Debug, Clone)]
pub struct HealthClient {
    client: Arc<Client>,
    base_url: Url,
}

impl HealthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::from_parts(Arc::new(client), normalize_base_url(base_url)?))
    }

    pub(crate) fn from_parts(client: Arc<Client>, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Fetch `/api/health`. Any non-2xx answer is an error.
    #[instrument(skip(self), level = "debug")]
    pub async fn check_connection(&self) -> Result<HealthReport, ApiError> {
        let url = self.base_url.join("api/health")?;
        let response = self.client.get(url).send().await?;
        let response = check_response(response).await?;

        response.json().await.map_err(|e| ApiError::Decode {
            endpoint: "/api/health".to_string(),
            message: e.to_string(),
        })
    }

    /// Probe each dashboard endpoint once.
    #[instrument(skip(self), level = "debug")]
    pub async fn check_endpoints(&self) -> EndpointStatus {
        let (health, weather, summary, alerts) = tokio::join!(
            self.probe("api/health"),
            self.probe("api/weather/current"),
            self.probe("api/weather/summary"),
            self.probe("api/alerts"),
        );

        EndpointStatus {
            health,
            weather,
            summary,
            alerts,
        }
    }

    async fn probe(&self, path: &str) -> bool {
        let url = match self.base_url.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build probe URL for {}: {}", path, e);
                return false;
            }
        };

        match self.client.get(url).send().await {
            Ok(response) => {
                tracing::debug!("Endpoint /{} status: {}", path, response.status());
                response.status().is_success()
            }
            Err(e) => {
                tracing::debug!("Endpoint /{} unreachable: {}", path, e);
                false
            }
        }
    }
}
