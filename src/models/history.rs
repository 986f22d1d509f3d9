//! Search history and favorites records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged search
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub city: String,
    pub country_code: String,
    pub searched_at: DateTime<Utc>,
}

/// A saved favorite city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: u64,
    pub city: String,
    pub country_code: String,
    pub added_at: DateTime<Utc>,
}

/// Request body for adding a favorite
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewFavorite {
    pub city: String,
    #[serde(default)]
    pub country_code: Option<String>,
}
