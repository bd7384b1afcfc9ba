use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AlertSeverity {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl From<String> for AlertSeverity {
    /// Unknown severities are treated as `normal`, matching the backend default.
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "warning" => Self::Warning,
            _ => Self::Normal,
        }
    }
}

impl AlertSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Latest observation for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub city: String,
    pub temperature: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub weather_condition: String,
    pub timestamp: String,
}

/// Aggregated weather for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub avg_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    #[serde(default)]
    pub avg_humidity: Option<f64>,
    #[serde(default)]
    pub dominant_condition: Option<String>,
}

impl DailySummary {
    /// Calendar day of this summary, if the backend date parses
    pub fn day(&self) -> Option<NaiveDate> {
        parse_timestamp(&self.date)
            .map(|ts| ts.date_naive())
            .or_else(|| NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok())
    }
}

/// An active weather alert raised by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub alert_id: String,
    pub city: String,
    pub alert_type: String,
    pub message: String,
    #[serde(default)]
    pub severity: AlertSeverity,
    pub timestamp: String,
}

/// Per-service flags reported by `/api/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceFlags {
    #[serde(default)]
    pub weather: bool,
    #[serde(default)]
    pub database: bool,
    #[serde(default)]
    pub alerts: bool,
}

/// Body of `/api/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub services: Option<ServiceFlags>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Parse a backend timestamp.
///
/// The backend emits RFC 3339 as well as naive ISO-8601 (`T` or space
/// separated, optional fractional seconds); naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
