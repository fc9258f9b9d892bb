use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location to load a forecast for. Built fresh from preferences on every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub location: String,
}

impl ForecastQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: location.into() }
    }
}

/// One decoded day of the forecast.
///
/// `date` is midnight UTC of the calendar day. It is derived from the entry's
/// position in the payload, never from a timestamp inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: DateTime<Utc>,
    pub description: String,
    pub high_temp: f64,
    pub low_temp: f64,
}

/// Why a load attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastErrorKind {
    NetworkError,
    Malformed,
    LocationNotFound,
    ServerError,
}

impl ForecastErrorKind {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NetworkError => "Could not reach the weather service. Check your connection and refresh.",
            Self::Malformed => "The weather service sent data we could not read.",
            Self::LocationNotFound => "That location could not be found. Check your preferred location.",
            Self::ServerError => "The weather service is having trouble right now. Try refreshing later.",
        }
    }
}

impl std::fmt::Display for ForecastErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NetworkError => "network error",
            Self::Malformed => "malformed response",
            Self::LocationNotFound => "location not found",
            Self::ServerError => "server error",
        };
        f.write_str(s)
    }
}

/// Outcome of one load cycle. Never edited after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastResult {
    /// One display line per day, earliest first.
    Success(Vec<String>),
    Failure(ForecastErrorKind),
}

impl ForecastResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
