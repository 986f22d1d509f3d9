//! Error types and handling for `WeatherDeck`

use thiserror::Error;

/// Main error type for weather lookups
#[derive(Error, Debug)]
pub enum WeatherError {
    /// Geocoding produced no candidate for the input
    #[error("Location not found: {query}")]
    NotFound { query: String },

    /// Non-success response or transport failure from the weather provider
    #[error("Upstream error{}: {message}", status_suffix(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// History / favorites store errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

impl WeatherError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(query: S) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    /// Create an upstream error for a response with the given HTTP status
    pub fn upstream<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create an upstream error for a transport-level failure (timeout, DNS, decoding)
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            status: None,
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::NotFound { .. } => "Location not found".to_string(),
            WeatherError::Upstream { message, .. } if !message.is_empty() => {
                format!("Failed to fetch weather data: {message}")
            }
            WeatherError::Upstream { .. } => "Failed to fetch weather data".to_string(),
            WeatherError::Validation { message } => format!("Invalid input: {message}"),
            WeatherError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            WeatherError::Storage { .. } => {
                "Search history is unavailable right now.".to_string()
            }
            WeatherError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
