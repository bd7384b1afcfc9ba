//! Weather API error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// True for failures of the exchange itself (connection, timeout, non-2xx).
    ///
    /// Read operations treat these as "no data"; everything else means the
    /// backend answered with something we could not understand.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Network(e) => !e.is_decode(),
            Self::Status { .. } => true,
            Self::Decode { .. } | Self::InvalidUrl(_) => false,
        }
    }

    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(e) if e.is_timeout() => "The weather backend timed out.".to_string(),
            Self::Network(_) => "Unable to reach the weather backend.".to_string(),
            Self::Status { status, .. } if *status == 404 => "Not found".to_string(),
            Self::Status { status, .. } if *status >= 500 => {
                format!("The weather backend failed ({}). Try again later.", status)
            }
            Self::Status { status, .. } => format!("Request rejected ({})", status),
            Self::Decode { .. } => "Failed to fetch weather data".to_string(),
            Self::InvalidUrl(_) => "The backend URL is invalid. Check settings.".to_string(),
        }
    }
}
