//! External collaborators of the weather lookup
//!
//! The service only talks to these traits; `openweather` is the production
//! implementation of the geocoding and weather sides, and
//! [`crate::history::HistoryStore`] implements the history side.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{LocationRecord, WeatherSample};
use crate::{Result, WeatherError};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Forward and reverse geocoding
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Ranked candidates for a free-text place name (possibly empty)
    async fn search(&self, text: &str) -> Result<Vec<LocationRecord>>;

    /// Ranked candidates for a coordinate pair (possibly empty)
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Vec<LocationRecord>>;
}

/// Current conditions and multi-day forecast series
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherSample>;

    /// Forecast samples in provider order (3-hour steps over five days for OpenWeatherMap)
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Vec<WeatherSample>>;
}

/// Append-only search log
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn record(&self, city: &str, country_code: &str) -> Result<()>;
}

/// Run one upstream call with an upper time bound; expiry is a transport failure.
pub async fn bounded<T, F>(timeout: Duration, call: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(WeatherError::transport(format!(
            "{call} timed out after {}s",
            timeout.as_secs_f64()
        ))),
    }
}
