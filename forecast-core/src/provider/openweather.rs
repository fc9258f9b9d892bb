use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{BuildError, ForecastProvider, NetworkError};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast/daily";
pub const DEFAULT_DAYS: u8 = 14;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeatherMap daily forecast over HTTP. Always requests metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    days: u8,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, NetworkError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            days: DEFAULT_DAYS,
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    fn build_request_target(&self, location: &str) -> Result<Url, BuildError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(BuildError::EmptyLocation);
        }

        let days = self.days.to_string();
        Url::parse_with_params(
            &self.base_url,
            &[
                ("q", location),
                ("mode", "json"),
                ("units", "metric"),
                ("cnt", days.as_str()),
                ("appid", self.api_key.as_str()),
            ],
        )
        .map_err(|source| BuildError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    async fn fetch(&self, target: &Url) -> Result<String, NetworkError> {
        let res = self.http.get(target.clone()).send().await?;

        let status = res.status();
        let body = res.text().await?;

        // OpenWeatherMap reports errors like an unknown city as a non-2xx
        // status with a JSON body; the decoder classifies those by `cod`.
        if !status.is_success() && serde_json::from_str::<serde_json::Value>(&body).is_err() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
