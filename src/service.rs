//! Weather aggregation service
//!
//! Single entry point for lookups: resolve the location, fetch current
//! conditions and the forecast series as a join, reduce the forecast to daily
//! summaries and hand back one [`WeatherResult`]. Search history is recorded
//! in the background and never affects the outcome of a lookup; callers that
//! exit right after a lookup await [`WeatherAggregationService::flush`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::forecast::ForecastAggregator;
use crate::location_resolver::{LocationInput, LocationResolver};
use crate::models::{LocationRecord, WeatherResult};
use crate::provider::{GeocodingProvider, HistoryRecorder, OpenWeatherClient, WeatherProvider, bounded};
use crate::{Result, WeatherError};

/// Produces normalized weather results from place names or coordinates
#[derive(Clone)]
pub struct WeatherAggregationService {
    resolver: LocationResolver,
    weather: Arc<dyn WeatherProvider>,
    history: Arc<dyn HistoryRecorder>,
    aggregator: ForecastAggregator,
    timeout: Duration,
    /// Pending history writes, shared between clones
    background: Arc<Mutex<JoinSet<()>>>,
}

impl WeatherAggregationService {
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        weather: Arc<dyn WeatherProvider>,
        history: Arc<dyn HistoryRecorder>,
        aggregator: ForecastAggregator,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver: LocationResolver::new(geocoder, timeout),
            weather,
            history,
            aggregator,
            timeout,
            background: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Wire the service to OpenWeatherMap using the application configuration
    pub fn from_config(config: &AppConfig, history: Arc<dyn HistoryRecorder>) -> anyhow::Result<Self> {
        let client = Arc::new(OpenWeatherClient::new(&config.provider)?);
        Ok(Self::new(
            client.clone(),
            client,
            history,
            ForecastAggregator::new(config.forecast.tz()?),
            config.provider.timeout(),
        ))
    }

    #[must_use]
    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    /// Weather for a free-text place name
    #[instrument(skip(self))]
    pub async fn get_weather_by_name(&self, query: &str) -> Result<WeatherResult> {
        self.get_weather(&LocationInput::Name(query.to_string())).await
    }

    /// Weather for a coordinate pair
    #[instrument(skip(self))]
    pub async fn get_weather_by_coordinates(&self, lat: f64, lon: f64) -> Result<WeatherResult> {
        self.get_weather(&LocationInput::Coordinates(lat, lon)).await
    }

    /// Weather for any parsed location input
    pub async fn get_weather(&self, input: &LocationInput) -> Result<WeatherResult> {
        if matches!(input, LocationInput::Name(name) if name.trim().is_empty()) {
            return Err(WeatherError::validation("Location cannot be empty"));
        }
        let location = self.resolver.resolve(input).await?;
        self.lookup(location).await
    }

    /// Wait for every history write started so far
    pub async fn flush(&self) {
        let mut pending = std::mem::take(
            &mut *self
                .background
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let count = pending.len();
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!("History task did not complete: {}", e);
            }
        }
        debug!("Flushed {} background history writes", count);
    }

    async fn lookup(&self, location: LocationRecord) -> Result<WeatherResult> {
        let (lat, lon) = (location.latitude, location.longitude);

        // Both calls always run to completion; the current-weather error wins if both fail
        let (current, forecast) = future::join(
            bounded(self.timeout, "current weather", self.weather.current_weather(lat, lon)),
            bounded(self.timeout, "forecast", self.weather.forecast(lat, lon)),
        )
        .await;
        let current = current?;
        let forecast = forecast?;

        let daily_forecasts = self.aggregator.aggregate(&forecast);
        info!(
            "Weather for {}: {:.1}°C, {} forecast days from {} samples",
            location.display_name(),
            current.temperature_c,
            daily_forecasts.len(),
            forecast.len()
        );

        self.record_history(&location);

        Ok(WeatherResult::new(location, current, daily_forecasts))
    }

    /// Runs in the background until [`Self::flush`]; failures are logged and dropped.
    fn record_history(&self, location: &LocationRecord) {
        let history = Arc::clone(&self.history);
        let city = location.name.clone();
        let country_code = location.country_code.clone();

        let mut background = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Reap finished writes so a long-running server does not accumulate them
        while background.try_join_next().is_some() {}
        background.spawn(async move {
            if let Err(e) = history.record(&city, &country_code).await {
                warn!("Failed to record search history for {}: {}", city, e);
            }
        });
    }
}
