//! Spotify provider configuration.

use const_format::concatcp;
use serde::{Deserialize, Serialize};
use vibecheck_core::{CoreError, ProvidersConfig};

/// Provider name used in config file
pub const PROVIDER_NAME: &str = "spotify";

/// Market used for top tracks
pub const DEFAULT_MARKET: &str = "US";

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Values shipped in older templates that were never filled in
const PLACEHOLDER_VALUES: &[&str] = &["your_actual_client_id_here", "your_actual_client_secret_here"];

/// Spotify-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyProviderConfig {
    /// Spotify app client ID
    #[serde(default)]
    pub client_id: String,
    /// Spotify app client secret
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_market")]
    pub market: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries on transient failures. Zero keeps every call a single attempt.
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_market() -> String {
    DEFAULT_MARKET.into()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.into()
}

impl SpotifyProviderConfig {
    /// Config with credentials and every other field at its default.
    pub fn with_credentials(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            market: default_market(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            api_base_url: default_api_base_url(),
            token_url: default_token_url(),
        }
    }

    /// Extract Spotify config from the dynamic providers config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed.
    pub fn from_providers(providers: &ProvidersConfig) -> Result<Option<Self>, CoreError> {
        providers.get(PROVIDER_NAME)
    }

    /// Validate that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential is empty or still a placeholder.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !is_real_credential(&self.client_id) {
            return Err(CoreError::ConfigMissingField {
                field: "providers.spotify.client_id".into(),
            });
        }
        if !is_real_credential(&self.client_secret) {
            return Err(CoreError::ConfigMissingField {
                field: "providers.spotify.client_secret".into(),
            });
        }
        if self.market.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "providers.spotify.market must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Every required field that is empty or a placeholder, by its config path.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !is_real_credential(&self.client_id) {
            missing.push("providers.spotify.client_id");
        }
        if !is_real_credential(&self.client_secret) {
            missing.push("providers.spotify.client_secret");
        }
        if self.market.trim().is_empty() {
            missing.push("providers.spotify.market");
        }
        missing
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        is_real_credential(&self.client_id) && is_real_credential(&self.client_secret)
    }
}

fn is_real_credential(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !PLACEHOLDER_VALUES.contains(&value)
}

/// Config template for Spotify provider.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"[providers.spotify]
# Get these from https://developer.spotify.com/dashboard
client_id = ""
client_secret = ""
# Market used for artist top tracks
market = ""#,
    DEFAULT_MARKET,
    r#""
timeout_secs = 10
# Extra attempts on transient failures (0 = single attempt)
max_retries = 0

"#
);
