//! Location Resolution Module
//!
//! This module turns location inputs (place names, coordinates) into exactly
//! one [`LocationRecord`] via the geocoding collaborator, or fails with
//! [`WeatherError::NotFound`]. The first ranked candidate always wins; nothing
//! is cached, every call re-queries the provider.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::LocationRecord;
use crate::provider::{GeocodingProvider, bounded};
use crate::{Result, WeatherError};

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Location name (city, region, etc.)
    Name(String),
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse "lat,lon" (or "lat lon") as coordinates, anything else as a name
    #[must_use]
    pub fn parse(input: &str) -> LocationInput {
        let input = input.trim();
        match Self::parse_coordinates(input) {
            Some((lat, lon)) => LocationInput::Coordinates(lat, lon),
            None => LocationInput::Name(input.to_string()),
        }
    }

    fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return None;
        }

        let lat = parts[0].parse::<f64>().ok()?;
        let lon = parts[1].parse::<f64>().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }

        Some((lat, lon))
    }
}

/// Service for resolving location inputs
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn GeocodingProvider>,
    timeout: Duration,
}

impl LocationResolver {
    #[must_use]
    pub fn new(geocoder: Arc<dyn GeocodingProvider>, timeout: Duration) -> Self {
        Self { geocoder, timeout }
    }

    /// Resolve a location input into a single location
    pub async fn resolve(&self, input: &LocationInput) -> Result<LocationRecord> {
        match input {
            LocationInput::Coordinates(lat, lon) => {
                self.resolve_by_coordinates(*lat, *lon).await
            }
            LocationInput::Name(name) => self.resolve_by_name(name).await,
        }
    }

    /// Resolve a location name via geocoding.
    ///
    /// An empty query, an empty candidate list or a failed geocoding call all
    /// mean the place could not be found.
    pub async fn resolve_by_name(&self, query: &str) -> Result<LocationRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::not_found(query));
        }

        debug!("Geocoding location name: {}", query);
        let candidates = match bounded(self.timeout, "geocoding", self.geocoder.search(query)).await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", query, e);
                return Err(WeatherError::not_found(query));
            }
        };

        let location = candidates
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::not_found(query))?;

        debug!(
            "Resolved '{}' to {} ({:.4}, {:.4})",
            query,
            location.display_name(),
            location.latitude,
            location.longitude
        );
        Ok(location)
    }

    /// Resolve coordinates to a named location via reverse geocoding.
    ///
    /// Coordinates are passed through unchecked; the provider decides what is valid.
    pub async fn resolve_by_coordinates(&self, lat: f64, lon: f64) -> Result<LocationRecord> {
        debug!("Resolving coordinates: ({}, {})", lat, lon);

        let candidates = bounded(
            self.timeout,
            "reverse geocoding",
            self.geocoder.reverse(lat, lon),
        )
        .await?;

        let location = candidates
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::not_found(format!("{lat:.4}, {lon:.4}")))?;

        debug!(
            "Resolved ({:.4}, {:.4}) to {}",
            lat,
            lon,
            location.display_name()
        );
        Ok(location)
    }

    /// All ranked candidates for a name, for callers that disambiguate themselves
    pub async fn candidates(&self, query: &str) -> Result<Vec<LocationRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::validation("Query parameter \"q\" is required"));
        }
        bounded(self.timeout, "geocoding", self.geocoder.search(query)).await
    }

    /// All ranked candidates for a coordinate pair
    pub async fn reverse_candidates(&self, lat: f64, lon: f64) -> Result<Vec<LocationRecord>> {
        bounded(
            self.timeout,
            "reverse geocoding",
            self.geocoder.reverse(lat, lon),
        )
        .await
    }
}
