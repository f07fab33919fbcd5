//! Typed failures of a poll cycle.
//!
//! None of these reach the user: the poller logs them and keeps the last
//! known weather. They exist so the log says which of the failure modes hit.

use thiserror::Error;

/// Why a weather fetch produced no new state.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// OpenWeather answered `cod: 401`. New keys take a while to activate.
    #[error("API key rejected or not yet active")]
    Unauthorized,

    /// The body parsed as JSON but carried no `main` object.
    #[error("Response has no weather payload (status {status})")]
    MissingPayload { status: u16 },

    #[error("Malformed weather response: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Why the current position could not be resolved.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LocationError::Timeout
        } else {
            LocationError::Other(err.to_string())
        }
    }
}
