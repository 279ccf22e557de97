//! Favorite tracks persisted in the key-value namespace.
//!
//! One entry per `(artist, title)` pair under the key `fav_<artist>_<title>`.
//! The collection is exactly the set of keys carrying that prefix, so listing
//! is a full key scan.

use crate::error::Result;
use crate::storage::{KeyValueStorage, StorageEvent};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Prefix shared by every favorite key
pub const FAVORITE_KEY_PREFIX: &str = "fav_";

/// Storage key for a favorite.
#[must_use]
pub fn favorite_key(artist: &str, title: &str) -> String {
    format!("{FAVORITE_KEY_PREFIX}{artist}_{title}")
}

/// Stored JSON value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFavorite {
    title: String,
    artist: String,
    timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    has_preview: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preview_url: Option<String>,
}

/// Extra data saved alongside a favorite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteMetadata {
    pub preview_url: Option<String>,
}

impl FavoriteMetadata {
    #[must_use]
    pub fn with_preview(preview_url: Option<&str>) -> Self {
        Self {
            preview_url: preview_url.filter(|u| !u.is_empty()).map(ToString::to_string),
        }
    }
}

/// A favorite read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub key: String,
    pub title: String,
    pub artist: String,
    /// Raw ISO-8601 timestamp as stored
    pub timestamp: String,
    pub saved_at: Option<DateTime<Utc>>,
    pub has_preview: bool,
    pub preview_url: Option<String>,
}

impl FavoriteEntry {
    fn parse(key: &str, raw: &str) -> std::result::Result<Self, serde_json::Error> {
        let stored: StoredFavorite = serde_json::from_str(raw)?;
        let saved_at = DateTime::parse_from_rfc3339(&stored.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc));
        let has_preview = stored.has_preview.unwrap_or(stored.preview_url.is_some());

        Ok(Self {
            key: key.to_string(),
            title: stored.title,
            artist: stored.artist,
            timestamp: stored.timestamp,
            saved_at,
            has_preview,
            preview_url: stored.preview_url,
        })
    }

    /// Label such as `Today`, `Yesterday` or `3 days ago`.
    #[must_use]
    pub fn date_label(&self, now: DateTime<Utc>) -> String {
        self.saved_at
            .map_or_else(|| self.timestamp.clone(), |t| relative_date_label(t, now))
    }
}

/// Relative label for a save date.
///
/// Day counts round up, so anything within the last 24 hours is `Today`.
/// Older than a week falls back to the calendar date.
#[must_use]
pub fn relative_date_label(saved_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    let elapsed_ms = (now - saved_at).num_milliseconds().abs();
    let days = ((elapsed_ms + DAY_MS - 1) / DAY_MS).max(1);

    match days {
        1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        3..=7 => format!("{} days ago", days - 1),
        _ => saved_at.format("%-m/%-d/%Y").to_string(),
    }
}

/// Favorites over a shared key-value namespace.
#[derive(Clone)]
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl FavoritesStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Whether the pair is saved. Absent keys read as `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn is_favorite(&self, artist: &str, title: &str) -> Result<bool> {
        Ok(self.storage.get(&favorite_key(artist, title)).await?.is_some())
    }

    /// Save the pair with the current time, overwriting any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn set_favorite(
        &self,
        artist: &str,
        title: &str,
        metadata: &FavoriteMetadata,
    ) -> Result<()> {
        self.set_favorite_at(artist, title, metadata, Utc::now()).await
    }

    /// Save the pair with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn set_favorite_at(
        &self,
        artist: &str,
        title: &str,
        metadata: &FavoriteMetadata,
        saved_at: DateTime<Utc>,
    ) -> Result<()> {
        let record = StoredFavorite {
            title: title.to_string(),
            artist: artist.to_string(),
            timestamp: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            has_preview: Some(metadata.preview_url.is_some()),
            preview_url: metadata.preview_url.clone(),
        };
        let value = serde_json::to_string(&record)?;

        debug!("Saving favorite {} - {}", artist, title);
        self.storage
            .set(&favorite_key(artist, title), &value)
            .await
    }

    /// Delete the pair. Absent entries are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn clear_favorite(&self, artist: &str, title: &str) -> Result<()> {
        self.remove_key(&favorite_key(artist, title)).await
    }

    /// Delete an entry by its storage key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn remove_key(&self, key: &str) -> Result<()> {
        debug!("Removing favorite {}", key);
        self.storage.remove(key).await
    }

    /// Flip the saved state of the pair and return the new state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn toggle_favorite(
        &self,
        artist: &str,
        title: &str,
        metadata: &FavoriteMetadata,
    ) -> Result<bool> {
        if self.is_favorite(artist, title).await? {
            self.clear_favorite(artist, title).await?;
            Ok(false)
        } else {
            self.set_favorite(artist, title, metadata).await?;
            Ok(true)
        }
    }

    /// Every favorite, newest first.
    ///
    /// Malformed values are logged and skipped. Entries whose timestamp does
    /// not parse sort after all dated entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn list_favorites(&self) -> Result<Vec<FavoriteEntry>> {
        let mut entries = Vec::new();

        for key in self.storage.keys().await? {
            if !key.starts_with(FAVORITE_KEY_PREFIX) {
                continue;
            }
            // Raced with a concurrent delete
            let Some(raw) = self.storage.get(&key).await? else {
                continue;
            };
            match FavoriteEntry::parse(&key, &raw) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping malformed favorite {}: {}", key, e),
            }
        }

        entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(entries)
    }

    /// Subscribe to changes of the underlying namespace.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.storage.subscribe()
    }
}

/// A favorites listing that re-reads on every relevant change.
///
/// A received change marks the view stale until a re-read succeeds, so an
/// interrupted re-read is retried by the next `refresh` or `changed`.
pub struct FavoritesView {
    store: FavoritesStore,
    events: broadcast::Receiver<StorageEvent>,
    entries: Vec<FavoriteEntry>,
    stale: bool,
}

impl FavoritesView {
    /// Subscribe and load the initial listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read fails.
    pub async fn open(store: FavoritesStore) -> Result<Self> {
        // Subscribe before reading so no change slips between the two
        let events = store.subscribe();
        let entries = store.list_favorites().await?;
        Ok(Self {
            store,
            events,
            entries,
            stale: false,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a change was seen that the listing does not reflect yet.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    #[must_use]
    pub const fn store(&self) -> &FavoritesStore {
        &self.store
    }

    /// Drain pending change notifications and re-read if any concerned
    /// favorites, or if an earlier re-read never finished. Returns whether a
    /// re-read happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the re-read fails; the view stays stale.
    pub async fn refresh(&mut self) -> Result<bool> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.stale |= event.affects_prefix(FAVORITE_KEY_PREFIX),
                // Missed events could be anything
                Err(TryRecvError::Lagged(_)) => self.stale = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        if !self.stale {
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    /// Wait until the listing is stale. Returns `false` once the storage has
    /// gone away.
    ///
    /// Cancel safe: nothing is lost if the future is dropped, so it can sit
    /// in a `select!` next to other branches. Follow it with [`refresh`].
    ///
    /// [`refresh`]: Self::refresh
    pub async fn wait_for_change(&mut self) -> bool {
        while !self.stale {
            match self.events.recv().await {
                Ok(event) => self.stale = event.affects_prefix(FAVORITE_KEY_PREFIX),
                Err(RecvError::Lagged(_)) => self.stale = true,
                Err(RecvError::Closed) => return false,
            }
        }
        true
    }

    /// Wait for the next change concerning favorites, then re-read.
    /// Returns `false` once the storage has gone away.
    ///
    /// # Errors
    ///
    /// Returns an error if the re-read fails; the view stays stale.
    pub async fn changed(&mut self) -> Result<bool> {
        if !self.wait_for_change().await {
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    /// Remove an entry by key and re-read.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn remove(&mut self, key: &str) -> Result<()> {
        self.store.remove_key(key).await?;
        self.reload().await
    }

    async fn reload(&mut self) -> Result<()> {
        self.entries = self.store.list_favorites().await?;
        self.stale = false;
        debug!("Favorites view reloaded with {} entries", self.entries.len());
        Ok(())
    }
}
