//! Data models for the WeatherDeck service
//!
//! - Location: resolved places
//! - Weather: observations, daily summaries and the aggregated lookup result
//! - History: search log entries and favorites

pub mod history;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use history::{Favorite, NewFavorite, SearchHistoryEntry};
pub use location::LocationRecord;
pub use weather::{DailyForecast, WeatherResult, WeatherSample, condition_icon};
