//! One fetch + decode cycle.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    dates::friendly_date_string,
    decoder::decode,
    format::{Units, format_high_low},
    model::{ForecastDay, ForecastQuery, ForecastResult},
    provider::ForecastProvider,
};

/// Runs a single load: build target, fetch, decode, render.
///
/// Holds no state between runs and never touches presentation state; the
/// caller decides what to do with the returned result.
#[derive(Debug, Clone)]
pub struct ForecastLoadTask {
    provider: Arc<dyn ForecastProvider>,
    units: Units,
}

impl ForecastLoadTask {
    pub fn new(provider: Arc<dyn ForecastProvider>, units: Units) -> Self {
        Self { provider, units }
    }

    pub async fn run(&self, query: &ForecastQuery) -> ForecastResult {
        self.run_at(query, Utc::now()).await
    }

    /// Same as [`run`](Self::run) with an explicit "now" for the decoder.
    pub async fn run_at(&self, query: &ForecastQuery, now: DateTime<Utc>) -> ForecastResult {
        let target = match self.provider.build_request_target(&query.location) {
            Ok(target) => target,
            Err(err) => {
                tracing::warn!(location = %query.location, error = %err, "could not build forecast request");
                return ForecastResult::Failure(err.kind());
            }
        };

        tracing::info!(location = %query.location, host = target.host_str().unwrap_or_default(), "fetching forecast");

        let body = match self.provider.fetch(&target).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "forecast fetch failed");
                return ForecastResult::Failure(err.kind());
            }
        };

        match decode(&body, now) {
            Ok(days) => {
                tracing::debug!(days = days.len(), "decoded forecast");
                ForecastResult::Success(days.iter().map(|day| self.display_line(day, now)).collect())
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not decode forecast");
                ForecastResult::Failure(err.kind())
            }
        }
    }

    fn display_line(&self, day: &ForecastDay, today: DateTime<Utc>) -> String {
        format!(
            "{} - {} - {}",
            friendly_date_string(day.date, today),
            day.description,
            format_high_low(day.high_temp, day.low_temp, self.units)
        )
    }
}
