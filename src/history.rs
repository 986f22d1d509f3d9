//! Persistent search history and favorites
//!
//! Both lists live in one fjall keyspace as postcard-encoded records. Writes
//! are read-modify-write cycles serialised by an async mutex; fjall I/O runs on
//! the blocking pool.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use fjall::{Database, Keyspace};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::Path;
use tokio::sync::Mutex;
use tokio::task;

use crate::WeatherError;
use crate::models::{Favorite, SearchHistoryEntry};
use crate::provider::HistoryRecorder;

const SEARCHES_KEY: &str = "search_history";
const FAVORITES_KEY: &str = "favorites";

#[derive(Serialize, Deserialize, Default)]
struct FavoritesState {
    next_id: u64,
    /// Oldest first
    favorites: Vec<Favorite>,
}

pub struct HistoryStore {
    _db: Database,
    store: Keyspace,
    max_history_entries: usize,
    write_lock: Mutex<()>,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl HistoryStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>, max_history_entries: usize) -> Result<Self> {
        let db = Database::builder(&path).open()?;
        let store = db.keyspace("history", fjall::KeyspaceCreateOptions::default)?;
        Ok(Self {
            _db: db,
            store,
            max_history_entries: max_history_entries.max(1),
            write_lock: Mutex::new(()),
        })
    }

    async fn load<T: DeserializeOwned + Default + Send + 'static>(&self, key: &str) -> Result<T> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;
        match maybe_bytes {
            Some(bytes) => Ok(postcard::from_bytes(&bytes)?),
            None => Ok(T::default()),
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let bytes = postcard::to_stdvec(value)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Append a search to the log, discarding the oldest entries beyond the limit
    #[tracing::instrument(name = "record_search", level = "debug", skip(self))]
    pub async fn record_search(&self, city: &str, country_code: &str) -> Result<SearchHistoryEntry> {
        let _guard = self.write_lock.lock().await;

        let mut searches: Vec<SearchHistoryEntry> = self.load(SEARCHES_KEY).await?;
        let entry = SearchHistoryEntry {
            city: city.to_string(),
            country_code: country_code.to_string(),
            searched_at: Utc::now(),
        };
        searches.push(entry.clone());

        if searches.len() > self.max_history_entries {
            let excess = searches.len() - self.max_history_entries;
            searches.drain(..excess);
        }

        self.save(SEARCHES_KEY, &searches).await?;
        tracing::debug!("Recorded search for {}, {}", city, country_code);
        Ok(entry)
    }

    /// Most recent searches, newest first
    pub async fn recent_searches(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>> {
        let searches: Vec<SearchHistoryEntry> = self.load(SEARCHES_KEY).await?;
        Ok(searches.into_iter().rev().take(limit).collect())
    }

    #[tracing::instrument(name = "add_favorite", level = "debug", skip(self))]
    pub async fn add_favorite(&self, city: &str, country_code: &str) -> Result<Favorite> {
        let city = city.trim();
        if city.is_empty() {
            return Err(anyhow!(WeatherError::validation("Favorite city cannot be empty")));
        }

        let _guard = self.write_lock.lock().await;
        let mut state: FavoritesState = self.load(FAVORITES_KEY).await?;

        state.next_id += 1;
        let favorite = Favorite {
            id: state.next_id,
            city: city.to_string(),
            country_code: country_code.to_string(),
            added_at: Utc::now(),
        };
        state.favorites.push(favorite.clone());

        self.save(FAVORITES_KEY, &state).await?;
        Ok(favorite)
    }

    /// All favorites, newest first
    pub async fn favorites(&self) -> Result<Vec<Favorite>> {
        let state: FavoritesState = self.load(FAVORITES_KEY).await?;
        Ok(state.favorites.into_iter().rev().collect())
    }

    /// Remove a favorite; returns whether it existed
    pub async fn remove_favorite(&self, id: u64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut state: FavoritesState = self.load(FAVORITES_KEY).await?;

        let before = state.favorites.len();
        state.favorites.retain(|favorite| favorite.id != id);
        let removed = state.favorites.len() != before;

        if removed {
            self.save(FAVORITES_KEY, &state).await?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl HistoryRecorder for HistoryStore {
    async fn record(&self, city: &str, country_code: &str) -> crate::Result<()> {
        self.record_search(city, country_code)
            .await
            .map(|_| ())
            .map_err(into_weather_error)
    }
}

/// Recover a typed error from the store, or wrap the failure as a storage error
pub fn into_weather_error(e: anyhow::Error) -> WeatherError {
    match e.downcast::<WeatherError>() {
        Ok(err) => err,
        Err(e) => WeatherError::storage(format!("{e:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir, max: usize) -> HistoryStore {
        HistoryStore::open(dir.path(), max).unwrap()
    }

    #[tokio::test]
    async fn test_recent_searches_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, 100);

        store.record_search("London", "GB").await.unwrap();
        store.record_search("Paris", "FR").await.unwrap();
        store.record_search("Tokyo", "JP").await.unwrap();

        let recent = store.recent_searches(2).await.unwrap();
        let cities: Vec<_> = recent.iter().map(|e| e.city.as_str()).collect();
        assert_eq!(cities, vec!["Tokyo", "Paris"]);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, 3);

        for city in ["A", "B", "C", "D", "E"] {
            store.record_search(city, "XX").await.unwrap();
        }

        let recent = store.recent_searches(10).await.unwrap();
        let cities: Vec<_> = recent.iter().map(|e| e.city.as_str()).collect();
        assert_eq!(cities, vec!["E", "D", "C"]);
    }

    #[tokio::test]
    async fn test_empty_store_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, 10);
        assert!(store.recent_searches(10).await.unwrap().is_empty());
        assert!(store.favorites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_favorites_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, 10);

        let london = store.add_favorite("London", "GB").await.unwrap();
        let paris = store.add_favorite("Paris", "FR").await.unwrap();
        assert_ne!(london.id, paris.id);

        let favorites = store.favorites().await.unwrap();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].city, "Paris");

        assert!(store.remove_favorite(london.id).await.unwrap());
        assert!(!store.remove_favorite(london.id).await.unwrap());

        let favorites = store.favorites().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, paris.id);

        // Ids are never reused
        let berlin = store.add_favorite("Berlin", "DE").await.unwrap();
        assert!(berlin.id > paris.id);
    }

    #[tokio::test]
    async fn test_empty_favorite_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, 10);
        let err = store.add_favorite("  ", "GB").await.unwrap_err();
        assert!(matches!(
            into_weather_error(err),
            WeatherError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_recorder_impl_appends() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, 10);

        HistoryRecorder::record(&store, "Lisbon", "PT").await.unwrap();

        let recent = store.recent_searches(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].country_code, "PT");
    }
}
