use serde::{Deserialize, Serialize};

/// Temperature units shown to the user. The API is always queried in metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!("Unknown units '{value}'. Supported units: metric, imperial.")),
        }
    }
}

fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Single temperature, rounded half away from zero, e.g. `21°`.
pub fn format_temperature(celsius: f64, units: Units) -> String {
    let value = match units {
        Units::Metric => celsius,
        Units::Imperial => celsius_to_fahrenheit(celsius),
    };
    // `+ 0.0` turns -0.0 into 0.0 so values like -0.4 print as `0°`.
    format!("{:.0}°", value.round() + 0.0)
}

/// `high° / low°` in the requested units.
pub fn format_high_low(high: f64, low: f64, units: Units) -> String {
    format!("{} / {}", format_temperature(high, units), format_temperature(low, units))
}
