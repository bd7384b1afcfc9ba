//! Weather backend client for SkyWatch
//!
//! Wire types, the [`WeatherApi`] seam used by the dashboard, its
//! reqwest implementation, health probes and display helpers.

pub mod cities;
pub mod client;
pub mod error;
pub mod format;
pub mod health;
pub mod types;

pub use cities::{find_city, City, CITIES, DEFAULT_CITY};
pub use client::{WeatherApi, WeatherClient, DEFAULT_SUMMARY_DAYS};
pub use error::ApiError;
pub use health::{EndpointStatus, HealthClient};
pub use types::*;
