//! Token lifecycle for the Spotify client-credentials flow.
//!
//! The app credentials are exchanged for a bearer token at the accounts
//! endpoint. The token is cached and reused until shortly before it expires;
//! a 401 from the API invalidates it.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::{CachedAccessToken, SpotifyAuthError, TokenResponse};

/// Buffer time before token expiration to trigger refresh (60 seconds)
const TOKEN_REFRESH_BUFFER_SECS: u64 = 60;

/// Manages the app access token.
pub struct SpotifyTokenManager {
    client_id: String,
    client_secret: String,
    token_url: String,
    client: reqwest::Client,
    cached_token: Arc<RwLock<Option<CachedAccessToken>>>,
}

impl SpotifyTokenManager {
    /// Create a new token manager.
    ///
    /// # Arguments
    ///
    /// * `client_id` / `client_secret` - Spotify app credentials
    /// * `token_url` - Accounts token endpoint
    /// * `client` - HTTP client for the exchange
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            client,
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`SpotifyAuthError`] if the exchange fails.
    pub async fn get_access_token(&self) -> Result<String, SpotifyAuthError> {
        // Fast path: check if we have a valid cached token
        {
            let token_guard = self.cached_token.read().await;
            if let Some(ref token) = *token_guard {
                if !token.is_expired(TOKEN_REFRESH_BUFFER_SECS) {
                    debug!("Using cached Spotify access token");
                    return Ok(token.access_token.clone());
                }
                debug!("Cached token is expired or expiring soon");
            }
        }

        // Slow path: need to refresh token
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<String, SpotifyAuthError> {
        let mut token_guard = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(ref token) = *token_guard {
            if !token.is_expired(TOKEN_REFRESH_BUFFER_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        info!("Requesting Spotify access token");
        let token = self.fetch_access_token().await?;
        let access_token = token.access_token.clone();
        *token_guard = Some(token);

        info!("Access token received successfully");
        Ok(access_token)
    }

    async fn fetch_access_token(&self) -> Result<CachedAccessToken, SpotifyAuthError> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(SpotifyAuthError::MissingCredentials);
        }

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        info!("Token request status: {}", response.status());
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Token request failed: HTTP {} - {}", status, body);
            return Err(SpotifyAuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyAuthError::TokenFetchFailed(e.to_string()))?;

        Ok(CachedAccessToken {
            access_token: token_response.access_token,
            fetched_at: Instant::now(),
            expires_in: Duration::from_secs(token_response.expires_in),
        })
    }

    /// Invalidate the cached token, forcing a refresh on next request.
    pub async fn invalidate_token(&self) {
        *self.cached_token.write().await = None;
        debug!("Invalidated cached Spotify access token");
    }
}
