//! Temperature and wind unit conversion
//!
//! All rounding in this crate goes through [`round_half_away`], which rounds
//! ties away from zero (`2.5 -> 3`, `-2.5 -> -3`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WeatherError;

/// Round to the nearest integer, ties away from zero.
#[must_use]
pub fn round_half_away(value: f64) -> f64 {
    value.round()
}

/// Convert Celsius to Fahrenheit, rounded to a whole degree.
///
/// No bounds checking: this is a display conversion, physically impossible
/// inputs are converted like any other value.
#[must_use]
pub fn to_fahrenheit(temp_c: f64) -> f64 {
    round_half_away(temp_c * 9.0 / 5.0 + 32.0)
}

/// Convert Fahrenheit to Celsius, rounded to a whole degree.
#[must_use]
pub fn to_celsius(temp_f: f64) -> f64 {
    round_half_away((temp_f - 32.0) * 5.0 / 9.0)
}

/// Convert m/s to km/h with one decimal place.
#[must_use]
pub fn ms_to_kmh(speed_ms: f64) -> f64 {
    round_half_away(speed_ms * 3.6 * 10.0) / 10.0
}

/// Temperature unit preference of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// The other unit
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "celsius" | "metric" => Ok(Self::Celsius),
            "f" | "fahrenheit" | "imperial" => Ok(Self::Fahrenheit),
            other => Err(WeatherError::validation(format!(
                "Unknown temperature unit '{other}'. Use celsius or fahrenheit"
            ))),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => write!(f, "celsius"),
            Self::Fahrenheit => write!(f, "fahrenheit"),
        }
    }
}

/// A temperature in both display units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl TemperatureReading {
    /// Celsius is rounded first and Fahrenheit is derived from the rounded value,
    /// so both numbers always describe the same displayed temperature.
    #[must_use]
    pub fn from_celsius(temp_c: f64) -> Self {
        let celsius = round_half_away(temp_c);
        Self {
            celsius,
            fahrenheit: to_fahrenheit(celsius),
        }
    }

    #[must_use]
    pub fn in_unit(&self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => self.celsius,
            TemperatureUnit::Fahrenheit => self.fahrenheit,
        }
    }

    #[must_use]
    pub fn format(&self, unit: TemperatureUnit) -> String {
        format!("{:.0}{}", self.in_unit(unit), unit.symbol())
    }
}
