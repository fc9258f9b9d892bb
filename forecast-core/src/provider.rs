use crate::{Config, model::ForecastErrorKind, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;
use url::Url;

pub mod openweather;

/// The request target could not be built; no network call was made.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Location is empty")]
    EmptyLocation,

    #[error("Invalid forecast endpoint '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl BuildError {
    /// A target that cannot be built is reported the same way as an unreadable response.
    pub fn kind(&self) -> ForecastErrorKind {
        ForecastErrorKind::Malformed
    }
}

/// Any transport-level failure.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Forecast request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Forecast service unreachable: {0}")]
    Unreachable(String),
}

impl NetworkError {
    pub fn kind(&self) -> ForecastErrorKind {
        ForecastErrorKind::NetworkError
    }
}

/// Source of raw forecast bodies.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Build the request target for `location`. Must not touch the network.
    fn build_request_target(&self, location: &str) -> Result<Url, BuildError>;

    /// Fetch the raw body for a target built by `build_request_target`.
    async fn fetch(&self, target: &Url) -> Result<String, NetworkError>;
}

/// Construct the forecast provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `forecast configure` and enter your OpenWeatherMap API key."
        )
    })?;

    let provider = OpenWeatherProvider::new(api_key.to_owned())?
        .with_base_url(config.base_url())
        .with_days(config.forecast_days());

    Ok(Box::new(provider))
}
