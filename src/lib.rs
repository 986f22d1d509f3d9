//! `WeatherDeck` - City weather lookup with a 5-day forecast
//!
//! This library resolves free-text places or coordinates to a location,
//! fetches current conditions and a forecast series from OpenWeatherMap and
//! reduces them to a normalized result. It also keeps a search history and a
//! favorites list and exposes everything over a small REST API.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod location_resolver;
pub mod models;
pub mod provider;
pub mod service;
pub mod units;
pub mod web;

// Re-export core types for public API
pub use config::AppConfig;
pub use error::WeatherError;
pub use forecast::ForecastAggregator;
pub use history::HistoryStore;
pub use location_resolver::{LocationInput, LocationParser, LocationResolver};
pub use models::{DailyForecast, LocationRecord, WeatherResult, WeatherSample};
pub use service::WeatherAggregationService;
pub use units::{TemperatureReading, TemperatureUnit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherError>;
