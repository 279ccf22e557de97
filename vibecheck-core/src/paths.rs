//! Path constants for configuration, storage and log files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "vibecheck";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the local key-value storage database (favorites live here)
pub const STORAGE_DB_FILE_NAME: &str = "local_storage.db";

/// The name of the log file written when file logging is enabled
pub const LOG_FILE_NAME: &str = "vibecheck.log";

/// Get the configuration directory path (~/.config/vibecheck/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/vibecheck/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the storage database path (`~/.config/vibecheck/local_storage.db`)
#[must_use]
pub fn storage_db_path() -> PathBuf {
    config_dir().join(STORAGE_DB_FILE_NAME)
}

/// Get the log file path (`~/.config/vibecheck/vibecheck.log`)
#[must_use]
pub fn log_file_path() -> PathBuf {
    config_dir().join(LOG_FILE_NAME)
}
