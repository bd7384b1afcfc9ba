//! Backend connection status for the health panel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use skywatch_weather::HealthClient;
use tokio::sync::watch;

use crate::scheduler::RefreshSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    #[default]
    Unchecked,
    Checking,
    Connected,
    Error,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::Checking => "checking",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceCheck {
    pub status: CheckStatus,
    pub last_checked: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ServiceCheck {
    fn connected(at: DateTime<Utc>) -> Self {
        Self {
            status: CheckStatus::Connected,
            last_checked: Some(at),
            error: None,
        }
    }

    fn failed(at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Error,
            last_checked: Some(at),
            error: Some(error.into()),
        }
    }

    fn endpoint(ok: bool, at: DateTime<Utc>, service: &str) -> Self {
        if ok {
            Self::connected(at)
        } else {
            Self::failed(at, format!("{} service unavailable", service))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub backend: ServiceCheck,
    pub weather: ServiceCheck,
    pub summary: ServiceCheck,
    pub alerts: ServiceCheck,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        self.services()
            .iter()
            .all(|(_, check)| check.status == CheckStatus::Connected)
    }

    /// Services in display order.
    pub fn services(&self) -> [(&'static str, &ServiceCheck); 4] {
        [
            ("backend", &self.backend),
            ("weather", &self.weather),
            ("summary", &self.summary),
            ("alerts", &self.alerts),
        ]
    }

    fn services_mut(&mut self) -> [&mut ServiceCheck; 4] {
        [
            &mut self.backend,
            &mut self.weather,
            &mut self.summary,
            &mut self.alerts,
        ]
    }
}

struct MonitorInner {
    health: HealthClient,
    status: Mutex<ConnectionStatus>,
    tx: watch::Sender<ConnectionStatus>,
}

impl MonitorInner {
    fn update(&self, f: impl FnOnce(&mut ConnectionStatus)) {
        let mut status = self.status.lock();
        f(&mut status);
        self.tx.send_replace(status.clone());
    }

    async fn check(&self) -> ConnectionStatus {
        self.update(|status| {
            for check in status.services_mut() {
                check.status = CheckStatus::Checking;
            }
        });

        if let Err(e) = self.health.check_connection().await {
            tracing::warn!("Backend health check failed: {}", e);
            let now = Utc::now();
            self.update(|status| {
                status.backend = ServiceCheck::failed(now, e.user_message());
                // Endpoints were not probed this round.
                for check in [&mut status.weather, &mut status.summary, &mut status.alerts] {
                    check.status = CheckStatus::Unchecked;
                }
            });
            return self.status.lock().clone();
        }

        let now = Utc::now();
        self.update(|status| status.backend = ServiceCheck::connected(now));

        let endpoints = self.health.check_endpoints().await;
        let now = Utc::now();
        self.update(|status| {
            status.weather = ServiceCheck::endpoint(endpoints.weather, now, "Weather");
            status.summary = ServiceCheck::endpoint(endpoints.summary, now, "Summary");
            status.alerts = ServiceCheck::endpoint(endpoints.alerts, now, "Alerts");
        });

        let status = self.status.lock().clone();
        tracing::info!("Connection check complete, all connected: {}", status.is_connected());
        status
    }
}

/// Tracks reachability of the backend and each dashboard endpoint.
pub struct ConnectionMonitor {
    inner: Arc<MonitorInner>,
    schedule: Mutex<Option<RefreshSchedule>>,
}

impl ConnectionMonitor {
    pub fn new(health: HealthClient) -> Self {
        let (tx, _) = watch::channel(ConnectionStatus::default());
        Self {
            inner: Arc::new(MonitorInner {
                health,
                status: Mutex::new(ConnectionStatus::default()),
                tx,
            }),
            schedule: Mutex::new(None),
        }
    }

    /// Probe the health endpoint, then every dashboard endpoint.
    ///
    /// When the health probe fails the backend is marked as errored and the
    /// endpoints are left unchecked.
    pub async fn check(&self) -> ConnectionStatus {
        self.inner.check().await
    }

    /// Check now and then every `period` until [`ConnectionMonitor::stop`].
    pub fn start(&self, period: Duration) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.check().await;
        });

        let inner = Arc::downgrade(&self.inner);
        let schedule = RefreshSchedule::start(period, move || {
            if let Some(inner) = inner.upgrade() {
                tokio::spawn(async move {
                    inner.check().await;
                });
            }
        });
        *self.schedule.lock() = Some(schedule);
    }

    pub fn stop(&self) {
        if let Some(schedule) = self.schedule.lock().take() {
            schedule.cancel();
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.lock().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.tx.subscribe()
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
