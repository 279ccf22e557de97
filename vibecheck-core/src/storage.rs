//! Flat key-value storage scoped to one user profile.
//!
//! Every handle to the same backend shares one change channel, so any view
//! holding a handle hears about writes made through any other handle.
//! Changes made by other processes are reported with a `None` key by whoever
//! watches the backing file.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
";

/// Capacity of the change notification channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A change to the storage namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed, or `None` when the change is not attributable
    /// (external writer, bulk clear)
    pub key: Option<String>,
}

impl StorageEvent {
    /// Whether a listener interested in `prefix` must re-read.
    #[must_use]
    pub fn affects_prefix(&self, prefix: &str) -> bool {
        self.key.as_deref().map_or(true, |k| k.starts_with(prefix))
    }
}

/// Durable, string-valued key-value namespace.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value; absent keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; absent keys are not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Every key in the namespace.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Change channel shared by all handles to this backend.
    fn events(&self) -> &broadcast::Sender<StorageEvent>;

    /// Subscribe to changes.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events().subscribe()
    }

    /// Report a change made outside this process.
    fn notify_external_change(&self) {
        // No subscribers is fine
        let _ = self.events().send(StorageEvent { key: None });
    }
}

fn publish(events: &broadcast::Sender<StorageEvent>, key: &str) {
    let _ = events.send(StorageEvent {
        key: Some(key.to_string()),
    });
}

/// In-memory backend. Clones share contents and the change channel.
#[derive(Clone)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            events,
        }
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> T {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.with_entries(|entries| entries.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_entries(|entries| entries.insert(key.to_string(), value.to_string()));
        publish(&self.events, key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let removed = self.with_entries(|entries| entries.remove(key));
        if removed.is_some() {
            publish(&self.events, key);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.with_entries(|entries| entries.keys().cloned().collect()))
    }

    fn events(&self) -> &broadcast::Sender<StorageEvent> {
        &self.events
    }
}

/// SQLite-backed durable storage.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Connection>,
    events: broadcast::Sender<StorageEvent>,
}

impl SqliteStorage {
    /// Open storage at the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or opened.
    pub async fn new() -> Result<Self> {
        let path = crate::paths::storage_db_path();
        Self::open(&path).await
    }

    /// Open storage at a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: &Path) -> Result<Self> {
        info!("Opening local storage database at {:?}", path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA_SQL)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            Ok(())
        })
        .await?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Arc::new(conn),
            events,
        })
    }

    /// Checkpoint WAL for clean shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the WAL checkpoint fails.
    pub async fn checkpoint(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
                Ok(())
            })
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                use rusqlite::OptionalExtension;

                let value = conn
                    .prepare_cached("SELECT value FROM kv WHERE key = ?1")?
                    .query_row(rusqlite::params![key], |row| row.get(0))
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(Into::into)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("storage set {}", key);
        let owned_key = key.to_string();
        let value = value.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r"
                    INSERT INTO kv (key, value) VALUES (?1, ?2)
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value
                ",
                    rusqlite::params![owned_key, value],
                )?;
                Ok(())
            })
            .await?;

        publish(&self.events, key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        debug!("storage remove {}", key);
        let owned_key = key.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![owned_key])?;
                Ok(deleted)
            })
            .await?;

        if deleted > 0 {
            publish(&self.events, key);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare_cached("SELECT key FROM kv ORDER BY key")?;
                let keys = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Into::into)
    }

    fn events(&self) -> &broadcast::Sender<StorageEvent> {
        &self.events
    }
}
