//! Client state - the single snapshot consumers render from
//!
//! Only the dashboard mutates it, through the transition methods below.
//! Each transition returns whether anything changed so callers can skip
//! publishing no-op updates.

use serde::Serialize;
use skywatch_weather::{DailySummary, WeatherAlert, WeatherReading};

/// Message shown when a fetch cycle fails for an unexpected reason
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch weather data";

/// Everything a consumer needs to render one city
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientState {
    /// Selected city (None until the dashboard is first activated)
    pub city: Option<String>,

    /// First reading returned for the city
    pub current_weather: Option<WeatherReading>,

    /// Daily summaries in the order the backend delivered them
    pub historical_data: Vec<DailySummary>,

    /// Active alerts for the city
    pub alerts: Vec<WeatherAlert>,

    /// True while at least one fetch cycle is in flight
    pub loading: bool,

    /// Set when the last cycle failed
    pub error: Option<String>,
}

/// Results of one joined fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleData {
    pub readings: Vec<WeatherReading>,
    pub summaries: Vec<DailySummary>,
    pub alerts: Vec<WeatherAlert>,
}

impl ClientState {
    /// Summary shown in the daily-summary section.
    pub fn today_summary(&self) -> Option<&DailySummary> {
        self.historical_data.first()
    }

    /// True when no section has anything to show.
    pub fn is_empty(&self) -> bool {
        self.current_weather.is_none() && self.historical_data.is_empty() && self.alerts.is_empty()
    }

    /// Switch to `city`. Data for any other city is dropped.
    pub(crate) fn select(&mut self, city: &str) -> bool {
        if self.city.as_deref() == Some(city) {
            return false;
        }
        self.city = Some(city.to_string());
        self.clear_data();
        self.error = None;
        true
    }

    /// A cycle started.
    pub(crate) fn begin_cycle(&mut self) -> bool {
        let changed = !self.loading || self.error.is_some();
        self.loading = true;
        self.error = None;
        changed
    }

    /// A cycle settled successfully; everything is replaced wholesale.
    pub(crate) fn apply_cycle(&mut self, data: CycleData, still_loading: bool) {
        self.current_weather = data.readings.into_iter().next();
        self.historical_data = data.summaries;
        self.alerts = data.alerts;
        self.error = None;
        self.loading = still_loading;
    }

    /// A cycle failed; previously fetched data is cleared.
    pub(crate) fn fail_cycle(&mut self, still_loading: bool) {
        self.clear_data();
        self.error = Some(FETCH_ERROR_MESSAGE.to_string());
        self.loading = still_loading;
    }

    /// Replace the alert list. Ignored while the last cycle is in error;
    /// the next cycle restores the data.
    pub(crate) fn replace_alerts(&mut self, alerts: Vec<WeatherAlert>) -> bool {
        if self.error.is_some() || self.alerts == alerts {
            return false;
        }
        self.alerts = alerts;
        true
    }

    pub(crate) fn stop(&mut self) -> bool {
        let changed = self.loading;
        self.loading = false;
        changed
    }

    fn clear_data(&mut self) {
        self.current_weather = None;
        self.historical_data.clear();
        self.alerts.clear();
    }
}
