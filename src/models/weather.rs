//! Weather observation and aggregated result models

use serde::{Deserialize, Serialize};

use super::LocationRecord;
use crate::units::{self, TemperatureReading};

/// One weather observation: the current conditions or one step of a forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    /// Observation time, seconds since the Unix epoch
    pub timestamp_utc: i64,
    /// Temperature in Celsius
    pub temperature_c: f64,
    /// Provider condition/icon code, e.g. "10d"
    pub condition_code: String,
    /// Human-readable description of weather conditions
    pub description: String,
    /// Relative humidity in percent
    pub humidity_pct: u8,
    /// Wind speed in m/s
    pub wind_speed_ms: f64,
    /// Atmospheric pressure in hPa
    pub pressure_hpa: u32,
}

impl WeatherSample {
    #[must_use]
    pub fn format_humidity(&self) -> String {
        format!("{}%", self.humidity_pct)
    }

    /// Format atmospheric pressure with unit
    #[must_use]
    pub fn format_pressure(&self) -> String {
        format!("{} hPa", self.pressure_hpa)
    }
}

/// Summary of one forecast day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// Weekday short name, e.g. "Mon"
    pub day_label: String,
    /// Mean of the day's sample temperatures, rounded to a whole degree
    pub average_temp_c: f64,
    pub average_temp_f: f64,
    /// Condition code of the first sample seen for this day
    pub representative_condition_code: String,
    /// Description of the first sample seen for this day
    pub description: String,
    pub icon: String,
}

/// Normalized lookup result handed to the presentation layer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResult {
    pub location: LocationRecord,
    pub current: WeatherSample,
    /// Current temperature in both display units
    pub temperature: TemperatureReading,
    pub wind_speed_kmh: f64,
    pub icon: String,
    /// At most five days, in first-seen order
    pub daily_forecasts: Vec<DailyForecast>,
}

impl WeatherResult {
    #[must_use]
    pub fn new(
        location: LocationRecord,
        current: WeatherSample,
        daily_forecasts: Vec<DailyForecast>,
    ) -> Self {
        Self {
            temperature: TemperatureReading::from_celsius(current.temperature_c),
            wind_speed_kmh: units::ms_to_kmh(current.wind_speed_ms),
            icon: condition_icon(&current.condition_code).to_string(),
            location,
            current,
            daily_forecasts,
        }
    }
}

/// Display icon name for a provider condition code; unknown codes show a cloud.
#[must_use]
pub fn condition_icon(code: &str) -> &'static str {
    match code {
        "01d" => "sun",
        "01n" => "moon",
        "02d" => "cloud-sun",
        "02n" => "cloud-moon",
        "03d" | "03n" | "04d" | "04n" => "cloud",
        "09d" | "09n" => "cloud-rain",
        "10d" => "cloud-sun-rain",
        "10n" => "cloud-moon-rain",
        "11d" | "11n" => "bolt",
        "13d" | "13n" => "snowflake",
        "50d" | "50n" => "smog",
        _ => "cloud",
    }
}
