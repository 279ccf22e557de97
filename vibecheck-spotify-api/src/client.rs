use crate::config::SpotifyProviderConfig;
use crate::token_manager::SpotifyTokenManager;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{info, warn};
use vibecheck_core::catalog::{
    ArtistRecord, ArtistSearchResponse, CatalogClient, SeveralArtistsResponse, TopTracksResponse,
    TrackSearchResponse,
};
use vibecheck_core::CatalogError;

/// Artists per free-text search
const ARTIST_SEARCH_LIMIT: u32 = 10;
/// Tracks per genre search
const GENRE_TRACK_LIMIT: u32 = 20;

const USER_AGENT: &str = "VibeCheck/0.1";

fn search_artists_url(base: &str, query: &str) -> String {
    format!(
        "{base}/search?q={}&type=artist&limit={ARTIST_SEARCH_LIMIT}",
        urlencoding::encode(query)
    )
}

fn search_by_genre_url(base: &str, genre: &str) -> String {
    format!(
        "{base}/search?q=genre:{}&type=track&limit={GENRE_TRACK_LIMIT}",
        urlencoding::encode(genre)
    )
}

fn artist_url(base: &str, id: &str) -> String {
    format!("{base}/artists/{}", urlencoding::encode(id))
}

fn top_tracks_url(base: &str, id: &str, market: &str) -> String {
    format!(
        "{base}/artists/{}/top-tracks?market={}",
        urlencoding::encode(id),
        urlencoding::encode(market)
    )
}

fn several_artists_url(base: &str, ids: &[String]) -> String {
    let ids: Vec<_> = ids.iter().map(|id| urlencoding::encode(id)).collect();
    format!("{base}/artists?ids={}", ids.join(","))
}

/// Spotify Web API catalog using an app (client-credentials) token.
pub struct SpotifyCatalog {
    client: ClientWithMiddleware,
    tokens: SpotifyTokenManager,
    api_base_url: String,
    market: String,
}

impl SpotifyCatalog {
    /// Build the HTTP stack from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &SpotifyProviderConfig) -> Result<Self, CatalogError> {
        // Base client with timeout
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()?;

        // Retries only when configured; the default is a single attempt
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(base_client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let tokens = SpotifyTokenManager::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.token_url.clone(),
            base_client,
        );

        Ok(Self {
            client,
            tokens,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            market: config.market.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
    ) -> Result<T, CatalogError> {
        let token = self.tokens.get_access_token().await?;

        info!("Spotify GET: {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| match e {
                reqwest_middleware::Error::Reqwest(e) => CatalogError::Network(e),
                reqwest_middleware::Error::Middleware(e) => CatalogError::Transport {
                    operation,
                    reason: e.to_string(),
                },
            })?;

        let status = response.status();
        info!("{} response status: {}", operation, status);

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate_token().await;
        }
        if !status.is_success() {
            warn!("{} failed with status {}", operation, status);
            return Err(CatalogError::Http {
                operation,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| CatalogError::Decode {
            operation,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogClient for SpotifyCatalog {
    async fn search_artists(&self, query: &str) -> Result<ArtistSearchResponse, CatalogError> {
        info!("Searching artists for: {}", query);
        let response: ArtistSearchResponse = self
            .get_json("Search", &search_artists_url(&self.api_base_url, query))
            .await?;
        info!("Search successful: {} artists found", response.artists.items.len());
        Ok(response)
    }

    async fn search_by_genre(&self, genre: &str) -> Result<TrackSearchResponse, CatalogError> {
        info!("Searching by genre: {}", genre);
        let response: TrackSearchResponse = self
            .get_json("Genre search", &search_by_genre_url(&self.api_base_url, genre))
            .await?;
        info!("Genre search successful: {} tracks found", response.tracks.items.len());
        Ok(response)
    }

    async fn get_artist(&self, id: &str) -> Result<ArtistRecord, CatalogError> {
        self.get_json("Get artist", &artist_url(&self.api_base_url, id))
            .await
    }

    async fn get_artist_top_tracks(&self, id: &str) -> Result<TopTracksResponse, CatalogError> {
        self.get_json(
            "Get top tracks",
            &top_tracks_url(&self.api_base_url, id, &self.market),
        )
        .await
    }

    async fn get_several_artists(
        &self,
        ids: &[String],
    ) -> Result<SeveralArtistsResponse, CatalogError> {
        if ids.is_empty() {
            return Ok(SeveralArtistsResponse::default());
        }
        self.get_json(
            "Get several artists",
            &several_artists_url(&self.api_base_url, ids),
        )
        .await
    }
}
