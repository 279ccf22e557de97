//! Cross-process change notifications for the favorites database.
//!
//! Another `vibecheck` process writing favorites changes the SQLite files on
//! disk but cannot reach this process's broadcast channel. The watcher turns
//! those file changes into a key-less storage event, which every open
//! favorites view answers with a full re-read.

use notify_debouncer_mini::notify::{self, RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vibecheck_core::KeyValueStorage;

/// Debounce window; one SQLite commit touches the db and its WAL several times
const DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Failed to initialize file watcher: {0}")]
    Watcher(#[from] notify::Error),
}

/// Running watcher. Dropping it stops file notifications.
pub struct FavoritesWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    task: JoinHandle<()>,
}

impl FavoritesWatcher {
    /// Wait for the forwarding task to finish after cancellation.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Whether `path` is the database or one of its `-wal`/`-shm` companions.
fn is_storage_file(path: &Path, db_file_name: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(db_file_name))
}

/// Watch the directory holding `db_path` and publish external changes on
/// `storage`.
///
/// # Errors
///
/// Returns an error if the file watcher cannot be created or the directory
/// cannot be watched.
pub fn watch_storage(
    db_path: &Path,
    storage: Arc<dyn KeyValueStorage>,
    cancel_token: CancellationToken,
) -> Result<FavoritesWatcher, WatcherError> {
    let db_file_name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (tx, mut rx) = mpsc::channel::<()>(1);

    let mut debouncer = new_debouncer(
        Duration::from_millis(DEBOUNCE_MS),
        move |res: DebounceEventResult| {
            if let Ok(events) = res {
                if events
                    .iter()
                    .any(|e| is_storage_file(&e.path, &db_file_name))
                {
                    // A full channel already means "re-read pending"
                    let _ = tx.try_send(());
                }
            }
        },
    )?;

    // Watch the parent directory; SQLite replaces and recreates its side files
    let watch_path = db_path
        .parent()
        .map_or_else(|| db_path.to_path_buf(), Path::to_path_buf);
    debouncer
        .watcher()
        .watch(&watch_path, RecursiveMode::NonRecursive)?;

    info!("Watching favorites storage for changes: {:?}", db_path);

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    info!("Favorites watcher shutting down");
                    break;
                }
                Some(()) = rx.recv() => {
                    debug!("Favorites storage changed on disk");
                    storage.notify_external_change();
                }
            }
        }
    });

    Ok(FavoritesWatcher {
        _debouncer: debouncer,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibecheck_core::MemoryStorage;

    #[test]
    fn test_storage_file_matching() {
        let db = "local_storage.db";
        assert!(is_storage_file(Path::new("/x/local_storage.db"), db));
        assert!(is_storage_file(Path::new("/x/local_storage.db-wal"), db));
        assert!(!is_storage_file(Path::new("/x/config.toml"), db));
        assert!(!is_storage_file(Path::new("/"), db));
    }

    #[tokio::test]
    async fn test_external_write_publishes_keyless_event() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("local_storage.db");
        let storage = Arc::new(MemoryStorage::new());
        let mut events = storage.subscribe();
        let cancel = CancellationToken::new();

        let watcher = watch_storage(&db_path, storage, cancel.clone()).unwrap();

        std::fs::write(&db_path, b"changed").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.key.is_none());

        cancel.cancel();
        watcher.join().await;
    }

    #[tokio::test]
    async fn test_unrelated_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("local_storage.db");
        let storage = Arc::new(MemoryStorage::new());
        let mut events = storage.subscribe();
        let cancel = CancellationToken::new();

        let watcher = watch_storage(&db_path, storage, cancel.clone()).unwrap();

        std::fs::write(dir.path().join("config.toml"), b"[ui]").unwrap();
        let result = tokio::time::timeout(Duration::from_millis(DEBOUNCE_MS * 3), events.recv()).await;
        assert!(result.is_err());

        cancel.cancel();
        watcher.join().await;
    }
}
