//! OpenWeatherMap client
//!
//! Implements [`GeocodingProvider`] and [`WeatherProvider`] on top of the
//! OpenWeatherMap geocoding (`/geo/1.0`) and weather (`/data/2.5`) APIs.
//! Every call is a single attempt; failures surface as
//! [`WeatherError::Upstream`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use super::{GeocodingProvider, WeatherProvider};
use crate::config::ProviderConfig;
use crate::models::{LocationRecord, WeatherSample};
use crate::{Result, WeatherError};

/// Responses slower than this are logged as warnings
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// HTTP client for the OpenWeatherMap APIs
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    geocode_limit: u32,
}

impl OpenWeatherClient {
    /// Create a new client; fails when no API key is configured
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                WeatherError::config(
                    "OpenWeatherMap API key is missing. Set provider.api_key or OPENWEATHER_API_KEY.",
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("WeatherDeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            geocode_limit: config.geocode_limit,
        })
    }

    /// GET `path_and_query` (which must already carry a `?`) and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}&appid={}", self.base_url, path_and_query, self.api_key);
        debug!("OpenWeatherMap request: {}{}", self.base_url, path_and_query);

        let start = Instant::now();
        let response = self.client.get(&url).send().await.map_err(|e| {
            let e = e.without_url();
            warn!("Network error calling OpenWeatherMap: {}", e);
            WeatherError::transport(format!("Request to OpenWeatherMap failed: {e}"))
        })?;

        let status = response.status();
        let elapsed = start.elapsed();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            elapsed.as_secs_f64()
        );
        if elapsed > SLOW_RESPONSE {
            warn!("Slow OpenWeatherMap response: {:.3}s", elapsed.as_secs_f64());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = owm::error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
            error!(
                "OpenWeatherMap API error: {} - {}",
                status.as_u16(),
                message
            );
            return Err(WeatherError::upstream(status.as_u16(), message));
        }

        response.json::<T>().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse OpenWeatherMap response: {}", e);
            WeatherError::transport(format!("Invalid data received from OpenWeatherMap: {e}"))
        })
    }
}

#[async_trait]
impl GeocodingProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn search(&self, text: &str) -> Result<Vec<LocationRecord>> {
        let results: Vec<owm::GeoResult> = self
            .get_json(&format!(
                "/geo/1.0/direct?q={}&limit={}",
                urlencoding::encode(text),
                self.geocode_limit
            ))
            .await?;

        if results.is_empty() {
            warn!("No geocoding results for '{}'", text);
        } else {
            info!("Found {} geocoding results for '{}'", results.len(), text);
        }

        Ok(results.into_iter().map(LocationRecord::from).collect())
    }

    #[instrument(skip(self))]
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Vec<LocationRecord>> {
        let results: Vec<owm::GeoResult> = self
            .get_json(&format!(
                "/geo/1.0/reverse?lat={latitude}&lon={longitude}&limit=1"
            ))
            .await?;

        Ok(results.into_iter().map(LocationRecord::from).collect())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherSample> {
        let current: owm::CurrentResponse = self
            .get_json(&format!(
                "/data/2.5/weather?lat={latitude}&lon={longitude}&units=metric"
            ))
            .await?;

        info!(
            "Current weather received for {} ({:.1}°C)",
            current.name, current.main.temp
        );
        Ok(current.into())
    }

    #[instrument(skip(self))]
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Vec<WeatherSample>> {
        let forecast: owm::ForecastResponse = self
            .get_json(&format!(
                "/data/2.5/forecast?lat={latitude}&lon={longitude}&units=metric"
            ))
            .await?;

        info!("Forecast received with {} samples", forecast.list.len());
        Ok(forecast.list.into_iter().map(WeatherSample::from).collect())
    }
}

/// OpenWeatherMap response structures and conversion utilities
mod owm {
    use serde::Deserialize;

    use crate::models::{LocationRecord, WeatherSample};

    #[derive(Debug, Deserialize)]
    pub struct GeoResult {
        pub name: String,
        pub lat: f64,
        pub lon: f64,
        pub country: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Main {
        pub temp: f64,
        #[serde(default)]
        pub humidity: f64,
        #[serde(default)]
        pub pressure: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub icon: String,
        pub description: String,
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct Wind {
        #[serde(default)]
        pub speed: f64,
    }

    /// `/data/2.5/weather`
    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub dt: i64,
        #[serde(default)]
        pub name: String,
        pub main: Main,
        #[serde(default)]
        pub weather: Vec<Condition>,
        #[serde(default)]
        pub wind: Wind,
    }

    /// One element of the `/data/2.5/forecast` list
    #[derive(Debug, Deserialize)]
    pub struct ForecastItem {
        pub dt: i64,
        pub main: Main,
        #[serde(default)]
        pub weather: Vec<Condition>,
        #[serde(default)]
        pub wind: Wind,
    }

    /// `/data/2.5/forecast`
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub list: Vec<ForecastItem>,
    }

    #[derive(Debug, Deserialize)]
    struct ErrorBody {
        message: String,
    }

    /// The `message` of an OpenWeatherMap error body, or the raw body text
    pub fn error_message(body: &str) -> Option<String> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        Some(
            serde_json::from_str::<ErrorBody>(body)
                .map(|b| b.message)
                .unwrap_or_else(|_| body.to_string()),
        )
    }

    fn sample(dt: i64, main: &Main, weather: Vec<Condition>, wind: &Wind) -> WeatherSample {
        let (condition_code, description) = weather
            .into_iter()
            .next()
            .map(|c| (c.icon, c.description))
            .unwrap_or_default();

        WeatherSample {
            timestamp_utc: dt,
            temperature_c: main.temp,
            condition_code,
            description,
            humidity_pct: main.humidity.round().clamp(0.0, 100.0) as u8,
            wind_speed_ms: wind.speed,
            pressure_hpa: main.pressure.round().max(0.0) as u32,
        }
    }

    impl From<GeoResult> for LocationRecord {
        fn from(result: GeoResult) -> Self {
            LocationRecord::new(
                result.name,
                result.country.unwrap_or_default(),
                result.lat,
                result.lon,
            )
        }
    }

    impl From<CurrentResponse> for WeatherSample {
        fn from(current: CurrentResponse) -> Self {
            sample(current.dt, &current.main, current.weather, &current.wind)
        }
    }

    impl From<ForecastItem> for WeatherSample {
        fn from(item: ForecastItem) -> Self {
            sample(item.dt, &item.main, item.weather, &item.wind)
        }
    }
}
