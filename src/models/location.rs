//! Location model for resolved places

use serde::{Deserialize, Serialize};

/// A place resolved by geocoding or reverse geocoding
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Place name (city, town, etc.)
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country_code: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl LocationRecord {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        country_code: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            country_code: country_code.into(),
            latitude,
            longitude,
        }
    }

    /// "London, GB", or just the name when the provider gave no country
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.country_code.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country_code)
        }
    }
}
