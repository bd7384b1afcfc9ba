//! Scripted in-memory weather backend for dashboard tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use skywatch_weather::{
    AlertSeverity, ApiError, DailySummary, WeatherAlert, WeatherApi, WeatherReading,
};
use tokio::sync::{Barrier, Semaphore};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Non-2xx answer; reads swallow this
    Transport,
    /// Body that does not decode
    Malformed,
}

impl Failure {
    fn error(self, op: &str) -> ApiError {
        match self {
            Failure::Transport => ApiError::Status {
                status: 503,
                message: "Service Unavailable".to_string(),
            },
            Failure::Malformed => ApiError::Decode {
                endpoint: op.to_string(),
                message: "expected value at line 1 column 1".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CityData {
    pub readings: Vec<WeatherReading>,
    pub summaries: Vec<DailySummary>,
    pub alerts: Vec<WeatherAlert>,
}

#[derive(Default)]
pub struct MockApi {
    cities: Mutex<HashMap<String, CityData>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    barrier: Mutex<Option<Arc<Barrier>>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_city(&self, city: &str, data: CityData) {
        self.cities.lock().insert(city.to_string(), data);
    }

    pub fn fail(&self, op: &'static str, failure: Failure) {
        self.failures.lock().insert(op, failure);
    }

    pub fn recover(&self, op: &'static str) {
        self.failures.lock().remove(op);
    }

    /// Block every read for `city` until [`MockApi::open`].
    ///
    /// Each permit added to the returned gate lets exactly one waiting call
    /// through, in the order the calls arrived.
    pub fn close(&self, city: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().insert(city.to_string(), gate.clone());
        gate
    }

    pub fn open(&self, city: &str) {
        if let Some(gate) = self.gates.lock().remove(city) {
            gate.add_permits(1024);
        }
    }

    /// Make every call wait until `parties` calls are in flight together.
    pub fn rendezvous(&self, parties: usize) {
        *self.barrier.lock() = Some(Arc::new(Barrier::new(parties)));
    }

    pub fn calls(&self, op: &str) -> usize {
        let prefix = format!("{}:", op);
        self.calls.lock().iter().filter(|c| c.starts_with(&prefix)).count()
    }

    pub fn calls_for(&self, op: &str, city: &str) -> usize {
        let key = format!("{}:{}", op, city);
        self.calls.lock().iter().filter(|c| **c == key).count()
    }

    async fn enter(&self, op: &'static str, target: &str) -> Result<(), ApiError> {
        self.calls.lock().push(format!("{}:{}", op, target));

        let gate = self.gates.lock().get(target).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let barrier = self.barrier.lock().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }

        let failure = self.failures.lock().get(op).copied();
        match failure {
            Some(failure) => Err(failure.error(op)),
            None => Ok(()),
        }
    }

    fn data(&self, city: &str) -> CityData {
        self.cities.lock().get(city).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl WeatherApi for MockApi {
    async fn current_weather(&self, city: Option<&str>) -> Result<Vec<WeatherReading>, ApiError> {
        let city = city.unwrap_or_default();
        self.enter("current", city).await?;
        Ok(self.data(city).readings)
    }

    async fn weather_summary(&self, city: &str, days: u32) -> Result<Vec<DailySummary>, ApiError> {
        self.enter("summary", city).await?;
        Ok(self.data(city).summaries.into_iter().take(days as usize).collect())
    }

    async fn alerts(&self, city: Option<&str>) -> Result<Vec<WeatherAlert>, ApiError> {
        let city = city.unwrap_or_default();
        self.enter("alerts", city).await?;
        Ok(self.data(city).alerts)
    }

    async fn resolve_alert(&self, alert_id: &str) -> Result<(), ApiError> {
        self.enter("resolve", alert_id).await?;

        let mut cities = self.cities.lock();
        let mut found = false;
        for data in cities.values_mut() {
            let before = data.alerts.len();
            data.alerts.retain(|a| a.alert_id != alert_id);
            found |= data.alerts.len() != before;
        }

        if found {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: 404,
                message: format!("Alert not found: {}", alert_id),
            })
        }
    }
}

pub fn reading(city: &str, temperature: f64) -> WeatherReading {
    WeatherReading {
        city: city.to_string(),
        temperature,
        feels_like: temperature + 2.0,
        humidity: Some(55.0),
        pressure: Some(1010.0),
        wind_speed: Some(3.0),
        weather_condition: "Clear".to_string(),
        timestamp: "2024-10-20T10:00:00".to_string(),
    }
}

/// Seven days ending 2024-10-20, oldest first.
pub fn week() -> Vec<DailySummary> {
    (14..=20)
        .map(|day| DailySummary {
            date: format!("2024-10-{:02}", day),
            avg_temp: 20.0 + day as f64,
            max_temp: 24.0 + day as f64,
            min_temp: 16.0 + day as f64,
            avg_humidity: Some(60.0),
            dominant_condition: Some("Clear".to_string()),
        })
        .collect()
}

pub fn alert(id: &str, city: &str, severity: AlertSeverity) -> WeatherAlert {
    WeatherAlert {
        alert_id: id.to_string(),
        city: city.to_string(),
        alert_type: "high_temperature".to_string(),
        message: format!("Temperature threshold exceeded in {}", city),
        severity,
        timestamp: "2024-10-20T10:00:00".to_string(),
    }
}

pub fn city_data(city: &str, temperature: f64, alert_ids: &[&str]) -> CityData {
    CityData {
        readings: vec![reading(city, temperature)],
        summaries: week(),
        alerts: alert_ids
            .iter()
            .map(|id| alert(id, city, AlertSeverity::Warning))
            .collect(),
    }
}

/// Let spawned tasks run without letting a paused clock auto-advance.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
