use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please edit it with your Spotify credentials and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Storage errors
    #[error("Storage database error: {0}")]
    StorageError(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("Failed to encode favorite record: {0}")]
    JsonError(#[from] serde_json::Error),

    // Catalog errors
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Failure of a single catalog request.
///
/// Credential problems are fatal and reported once; everything else is a
/// transient failure the caller turns into a notice plus a fallback render.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Client id or secret is empty or still the template placeholder.
    #[error("Spotify API credentials are missing or not updated")]
    MissingCredentials,

    /// The token endpoint rejected the client credentials.
    #[error("Spotify authentication failed: {reason}")]
    AuthFailed { reason: String },

    /// The catalog answered with a non-success status.
    #[error("{operation} failed! status: {status}")]
    Http { operation: &'static str, status: u16 },

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure raised by the HTTP middleware stack (retry exhaustion and the like)
    #[error("{operation} request failed: {reason}")]
    Transport {
        operation: &'static str,
        reason: String,
    },

    #[error("Failed to decode {operation} response: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },
}

impl CatalogError {
    /// Whether this failure comes from missing or rejected credentials.
    #[must_use]
    pub const fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::AuthFailed { .. } | Self::Http { status: 401, .. }
        )
    }

    /// HTTP status carried by the failure, if the service answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failure to start an audio preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Preview source is empty")]
    NoSource,

    #[error("Failed to start preview player `{player}`: {reason}")]
    StartFailed { player: String, reason: String },
}
