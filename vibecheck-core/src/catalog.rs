//! Catalog service contract.
//!
//! Record types mirror the subset of the Spotify Web API JSON the app reads;
//! unknown fields are ignored. [`CatalogClient`] is implemented by the
//! `vibecheck-spotify-api` crate and by scripted catalogs in tests.

use crate::error::CatalogError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// Full artist object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl ArtistRecord {
    /// URL of the largest image (the API lists them widest first)
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }
}

/// Artist reference embedded in a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    /// 30-second preview clip, absent for many tracks
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paging<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u32>,
}

impl<T> Default for Paging<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSearchResponse {
    #[serde(default)]
    pub artists: Paging<ArtistRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSearchResponse {
    #[serde(default)]
    pub tracks: Paging<TrackRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopTracksResponse {
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
}

/// Several-artists lookup. Unknown ids come back as `null` and are dropped
/// here without reordering the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveralArtistsResponse {
    #[serde(default, deserialize_with = "skip_null_artists")]
    pub artists: Vec<ArtistRecord>,
}

fn skip_null_artists<'de, D>(deserializer: D) -> Result<Vec<ArtistRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<ArtistRecord>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().flatten().collect())
}

/// Remote music catalog.
///
/// Every call is a single attempt. Implementations handle credential exchange
/// and token caching themselves and fail with a status-carrying
/// [`CatalogError::Http`] when the service rejects a request.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search artists by free text.
    async fn search_artists(&self, query: &str) -> Result<ArtistSearchResponse, CatalogError>;

    /// Search tracks tagged with `genre`.
    async fn search_by_genre(&self, genre: &str) -> Result<TrackSearchResponse, CatalogError>;

    /// Fetch one artist.
    async fn get_artist(&self, id: &str) -> Result<ArtistRecord, CatalogError>;

    /// Fetch an artist's top tracks.
    async fn get_artist_top_tracks(&self, id: &str) -> Result<TopTracksResponse, CatalogError>;

    /// Fetch several artists, in the order of `ids`.
    async fn get_several_artists(
        &self,
        ids: &[String],
    ) -> Result<SeveralArtistsResponse, CatalogError>;
}
