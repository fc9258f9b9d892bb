//! Decoding of the OpenWeatherMap daily forecast payload.
//!
//! The payload is loosely structured, so it is walked as a `serde_json::Value`
//! rather than deserialized into fixed structs: the status code may arrive as a
//! string or a number, and an error response carries no `list` at all.
//!
//! Recognized shape:
//!
//! ```json
//! { "cod": "200",
//!   "list": [ { "weather": [ { "main": "Clear" } ],
//!               "temp": { "max": 20.0, "min": 10.0 } } ] }
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::{
    dates::day_timestamp,
    model::{ForecastDay, ForecastErrorKind},
};

const OWM_MESSAGE_CODE: &str = "cod";
const OWM_MESSAGE: &str = "message";
const OWM_LIST: &str = "list";
const OWM_WEATHER: &str = "weather";
const OWM_DESCRIPTION: &str = "main";
const OWM_TEMPERATURE: &str = "temp";
const OWM_MAX: &str = "max";
const OWM_MIN: &str = "min";

const STATUS_OK: u64 = 200;
const STATUS_NOT_FOUND: u64 = 404;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Forecast body is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Forecast status code is not a number: {0}")]
    InvalidStatus(String),

    #[error("Forecast response has no `{0}` array")]
    MissingList(&'static str),

    #[error("Forecast day {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Forecast location not found")]
    LocationNotFound,

    #[error("Forecast service returned status {code}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { code: u64, message: Option<String> },
}

impl DecodeError {
    pub fn kind(&self) -> ForecastErrorKind {
        match self {
            DecodeError::LocationNotFound => ForecastErrorKind::LocationNotFound,
            DecodeError::Server { .. } => ForecastErrorKind::ServerError,
            DecodeError::Syntax(_)
            | DecodeError::InvalidStatus(_)
            | DecodeError::MissingList(_)
            | DecodeError::MissingField { .. } => ForecastErrorKind::Malformed,
        }
    }
}

/// Decode `raw` into one `ForecastDay` per entry of the `list` array.
///
/// Dates are assigned by position starting from the UTC day of `reference`.
/// Any failure in any day fails the whole decode.
pub fn decode(raw: &str, reference: DateTime<Utc>) -> Result<Vec<ForecastDay>, DecodeError> {
    let json: Value = serde_json::from_str(raw)?;

    check_status(&json)?;

    let list = json
        .get(OWM_LIST)
        .and_then(Value::as_array)
        .ok_or(DecodeError::MissingList(OWM_LIST))?;

    list.iter()
        .enumerate()
        .map(|(index, day)| decode_day(day, index, reference))
        .collect()
}

/// An absent status code counts as success.
fn check_status(json: &Value) -> Result<(), DecodeError> {
    let Some(code) = json.get(OWM_MESSAGE_CODE) else {
        return Ok(());
    };

    let code = match code {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| DecodeError::InvalidStatus(code.to_string()))?;

    match code {
        STATUS_OK => Ok(()),
        STATUS_NOT_FOUND => Err(DecodeError::LocationNotFound),
        _ => Err(DecodeError::Server {
            code,
            message: json.get(OWM_MESSAGE).and_then(Value::as_str).map(str::to_owned),
        }),
    }
}

fn decode_day(day: &Value, index: usize, reference: DateTime<Utc>) -> Result<ForecastDay, DecodeError> {
    let missing = |field| DecodeError::MissingField { index, field };

    let description = day
        .get(OWM_WEATHER)
        .and_then(Value::as_array)
        .and_then(|weather| weather.first())
        .and_then(|first| first.get(OWM_DESCRIPTION))
        .and_then(Value::as_str)
        .ok_or_else(|| missing("weather[0].main"))?;

    let temperature = day.get(OWM_TEMPERATURE).ok_or_else(|| missing("temp"))?;
    let high_temp = temperature
        .get(OWM_MAX)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing("temp.max"))?;
    let low_temp = temperature
        .get(OWM_MIN)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing("temp.min"))?;

    Ok(ForecastDay {
        date: day_timestamp(reference, index),
        description: description.to_owned(),
        high_temp,
        low_temp,
    })
}
