//! Display helpers shared by dashboard consumers.

use crate::types::parse_timestamp;

pub fn format_temperature(celsius: f64) -> String {
    format!("{:.1}°C", celsius)
}

pub fn format_wind_speed(meters_per_second: f64) -> String {
    format!("{:.1} m/s", meters_per_second)
}

/// `Oct 20, 2024, 10:00 AM`; unparseable input is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|ts| ts.format("%b %d, %Y, %I:%M %p").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// `Oct 20, 2024`; unparseable input is returned unchanged.
pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|ts| ts.date_naive())
        .or_else(|| chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}
