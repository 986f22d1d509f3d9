//! Command-line interface for `weatherdeck`
//!
//! Parses arguments with clap, installs the tracing subscriber and dispatches
//! to the web server or one of the one-shot commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, LoggingConfig};
use crate::history::{HistoryStore, into_weather_error};
use crate::location_resolver::LocationParser;
use crate::models::WeatherResult;
use crate::service::WeatherAggregationService;
use crate::units::TemperatureUnit;
use crate::web;

/// WeatherDeck - City weather lookup with a 5-day forecast
#[derive(Parser, Debug)]
#[command(name = "weatherdeck")]
#[command(about = "City weather lookup with a 5-day forecast, search history and favorites")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the REST API and static file server
    Serve {
        /// Port to listen on, overrides the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Look up current weather and the 5-day forecast
    Weather {
        /// City name or "lat,lon" coordinates
        #[arg(short, long)]
        location: String,

        /// Temperature unit for display
        #[arg(short, long, default_value = "celsius")]
        unit: TemperatureUnit,
    },
    /// Show the most recent searches
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`, which wins
/// over the configured level.
pub fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weatherdeck={default_level},tower_http={default_level}")));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = installed {
        eprintln!("Tracing subscriber already installed: {e}");
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_from_path(cli.config.clone())?;
    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let history = open_history(&config)?;
            let service = WeatherAggregationService::from_config(&config, history.clone())?;
            web::run(&config, service, history).await
        }
        Command::Weather { location, unit } => {
            tracing::debug!("Fetching weather for: {}", location);
            let history = open_history(&config)?;
            let service = WeatherAggregationService::from_config(&config, history)?;
            let input = LocationParser::parse(&location);
            let result = service
                .get_weather(&input)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", format_weather(&result, unit));
            // The runtime shuts down with main; the search must land first
            service.flush().await;
            Ok(())
        }
        Command::History { limit } => {
            let history = open_history(&config)?;
            let entries = history
                .recent_searches(limit)
                .await
                .map_err(|e| anyhow::anyhow!(into_weather_error(e).user_message()))?;
            if entries.is_empty() {
                println!("No searches yet.");
            }
            for entry in entries {
                println!(
                    "{}  {}, {}",
                    entry.searched_at.format("%Y-%m-%d %H:%M"),
                    entry.city,
                    entry.country_code
                );
            }
            Ok(())
        }
    }
}

fn open_history(config: &AppConfig) -> Result<Arc<HistoryStore>> {
    let store = HistoryStore::open(
        &config.storage.path,
        config.storage.max_history_entries as usize,
    )
    .with_context(|| format!("Failed to open history database at {}", config.storage.path))?;
    Ok(Arc::new(store))
}

/// Render a lookup result for the terminal
#[must_use]
pub fn format_weather(result: &WeatherResult, unit: TemperatureUnit) -> String {
    let current = &result.current;
    let mut out = format!(
        "Weather for {}\n  {}  {}\n  Humidity: {}  Wind: {:.1} km/h  Pressure: {}\n",
        result.location.display_name(),
        result.temperature.format(unit),
        current.description,
        current.format_humidity(),
        result.wind_speed_kmh,
        current.format_pressure(),
    );

    if !result.daily_forecasts.is_empty() {
        out.push_str("\n5-Day Forecast\n");
    }
    for day in &result.daily_forecasts {
        let temp = match unit {
            TemperatureUnit::Celsius => day.average_temp_c,
            TemperatureUnit::Fahrenheit => day.average_temp_f,
        };
        out.push_str(&format!(
            "  {:<4}{:>5}  {}\n",
            day.day_label,
            format!("{temp:.0}{}", unit.symbol()),
            day.description
        ));
    }
    out
}
