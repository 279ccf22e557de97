//! Authentication types for the client-credentials flow.

use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use vibecheck_core::CatalogError;

/// Authentication errors for the client-credentials exchange
#[derive(Debug, Error)]
pub enum SpotifyAuthError {
    /// Client id or secret missing from the config
    #[error("Spotify API credentials are missing or not updated")]
    MissingCredentials,

    /// Token endpoint answered with a non-success status
    #[error("Token request failed: HTTP {status}. Check your Client ID and Secret.")]
    Rejected { status: u16 },

    /// Token endpoint answered with something we could not read
    #[error("Failed to get access token: {0}")]
    TokenFetchFailed(String),

    /// Network error during authentication
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<SpotifyAuthError> for CatalogError {
    fn from(err: SpotifyAuthError) -> Self {
        match err {
            SpotifyAuthError::MissingCredentials => Self::MissingCredentials,
            SpotifyAuthError::Network(e) => Self::Network(e),
            other => Self::AuthFailed {
                reason: other.to_string(),
            },
        }
    }
}

/// Cached access token with expiration tracking
#[derive(Debug, Clone)]
pub struct CachedAccessToken {
    /// The Bearer token for API requests
    pub access_token: String,
    /// Local timestamp when the token was fetched
    pub fetched_at: Instant,
    /// Lifetime granted by the token endpoint
    pub expires_in: Duration,
}

impl CachedAccessToken {
    /// Check if token is expired or will expire within the buffer time.
    #[must_use]
    pub fn is_expired(&self, buffer_secs: u64) -> bool {
        let remaining = self.expires_in.saturating_sub(self.fetched_at.elapsed());
        remaining <= Duration::from_secs(buffer_secs)
    }
}

/// Response from the accounts token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    pub expires_in: u64,
}
