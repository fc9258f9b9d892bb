//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - Decoding of the OpenWeatherMap daily forecast payload
//! - A single-flight, caching loader that delivers each result once
//! - The Loading / Content / Error view state driven by that loader
//! - Preferences, transport and display formatting around them
//!
//! It is used by `forecast-cli`, but can also be embedded in other front ends.

pub mod config;
pub mod dates;
pub mod decoder;
pub mod format;
pub mod loader;
pub mod model;
pub mod provider;
pub mod task;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Config, PreferenceSource, StoredPreferences};
pub use decoder::{DecodeError, decode};
pub use format::Units;
pub use loader::{ForecastLoader, LoadEvent, StartOutcome};
pub use model::{ForecastDay, ForecastErrorKind, ForecastQuery, ForecastResult};
pub use provider::{BuildError, ForecastProvider, NetworkError, provider_from_config};
pub use task::ForecastLoadTask;
pub use view::{ForecastScreen, ForecastViewState};
