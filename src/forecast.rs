//! Daily forecast aggregation
//!
//! Reduces a flat, timestamped forecast series (typically 3-hour steps over
//! five days) to one summary per calendar day. Days are keyed by their weekday
//! short name in the aggregator's time zone and emitted in the order they are
//! first seen in the input.

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

use crate::models::{DailyForecast, WeatherSample, condition_icon};
use crate::units;

/// Maximum number of days in an aggregated forecast
pub const MAX_FORECAST_DAYS: usize = 5;

struct DayBucket {
    label: String,
    temps: Vec<f64>,
    condition_code: String,
    description: String,
}

/// Groups forecast samples into daily buckets
#[derive(Debug, Clone, Copy)]
pub struct ForecastAggregator {
    timezone: Tz,
}

impl Default for ForecastAggregator {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl ForecastAggregator {
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Weekday short name ("Mon") of an epoch timestamp in this aggregator's
    /// zone, `None` when the timestamp is out of chrono's range
    #[must_use]
    pub fn day_label(&self, timestamp_utc: i64) -> Option<String> {
        DateTime::from_timestamp(timestamp_utc, 0)
            .map(|dt| dt.with_timezone(&self.timezone).format("%a").to_string())
    }

    /// Aggregate samples into at most [`MAX_FORECAST_DAYS`] daily summaries.
    ///
    /// The condition code and description of a day come from the first sample
    /// seen for it, not from the most frequent one. Samples whose timestamp
    /// cannot be represented are skipped.
    #[must_use]
    pub fn aggregate(&self, samples: &[WeatherSample]) -> Vec<DailyForecast> {
        let mut buckets: Vec<DayBucket> = Vec::new();

        for sample in samples {
            let Some(label) = self.day_label(sample.timestamp_utc) else {
                debug!("Skipping sample with unrepresentable timestamp {}", sample.timestamp_utc);
                continue;
            };
            match buckets.iter_mut().find(|bucket| bucket.label == label) {
                Some(bucket) => bucket.temps.push(sample.temperature_c),
                None => buckets.push(DayBucket {
                    label,
                    temps: vec![sample.temperature_c],
                    condition_code: sample.condition_code.clone(),
                    description: sample.description.clone(),
                }),
            }
        }

        debug!(
            "Aggregated {} samples into {} days ({})",
            samples.len(),
            buckets.len(),
            self.timezone
        );

        buckets
            .into_iter()
            .take(MAX_FORECAST_DAYS)
            .map(|bucket| {
                let mean = bucket.temps.iter().sum::<f64>() / bucket.temps.len() as f64;
                let average_temp_c = units::round_half_away(mean);
                DailyForecast {
                    icon: condition_icon(&bucket.condition_code).to_string(),
                    day_label: bucket.label,
                    average_temp_c,
                    average_temp_f: units::to_fahrenheit(average_temp_c),
                    representative_condition_code: bucket.condition_code,
                    description: bucket.description,
                }
            })
            .collect()
    }
}
