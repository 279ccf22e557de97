//! Artist detail page: profile plus top tracks.

use crate::catalog::{ArtistRecord, CatalogClient, TrackRecord};
use crate::error::CatalogError;
use crate::favorites::{FavoriteMetadata, FavoritesStore};
use tracing::{info, warn};
use url::form_urlencoded;

/// Shown when the artist has no image
pub const NO_IMAGE_DATA_URI: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMzAwIiBoZWlnaHQ9IjMwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iMTAwJSIgaGVpZ2h0PSIxMDAlIiBmaWxsPSIjMUQxRDFEIi8+PHRleHQgeD0iNTAlIiB5PSI1MCUiIGZvbnQtZmFtaWx5PSJBcmlhbCIgZm9udC1zaXplPSIxNCIgZmlsbD0iI0Y1RjVGNSIgdGV4dC1hbmNob3I9Im1pZGRsZSIgZHk9Ii4zZW0iPk5vIEltYWdlPC90ZXh0Pjwvc3ZnPg==";

/// Id that never hits the catalog
pub const DEMO_ARTIST_ID: &str = "demo";

const MSG_LOAD_FAILED: &str = "Error loading artist information. Please try again.";
const TRACK_URL_BASE: &str = "https://open.spotify.com/track/";

/// Entry parameters of the artist page (`artistId`, `artistName`, `fromHome`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistPageRequest {
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub from_home: bool,
}

impl ArtistPageRequest {
    /// Request issued when a card on the home page is opened.
    pub fn for_artist(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            artist_id: Some(id.into()),
            artist_name: Some(name.into()),
            from_home: true,
        }
    }

    /// Parse a URL query string. A leading `?` is ignored, empty values
    /// count as absent.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut request = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "artistId" if !value.is_empty() => request.artist_id = Some(value.to_string()),
                "artistName" if !value.is_empty() => {
                    request.artist_name = Some(value.to_string());
                }
                "fromHome" => request.from_home = value == "true",
                _ => {}
            }
        }
        request
    }

    /// Encode back into a query string.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(id) = &self.artist_id {
            serializer.append_pair("artistId", id);
        }
        if let Some(name) = &self.artist_name {
            serializer.append_pair("artistName", name);
        }
        if self.from_home {
            serializer.append_pair("fromHome", "true");
        }
        serializer.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistProfile {
    pub id: Option<String>,
    pub name: String,
    pub image_url: String,
    /// `1.2M Followers`, or `Demo Artist` for synthesized pages
    pub followers_label: String,
    pub genre_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    /// 1-based position
    pub number: usize,
    pub track_id: Option<String>,
    pub title: String,
    pub album: String,
    pub preview_url: Option<String>,
    pub spotify_url: Option<String>,
    pub favorite: bool,
}

impl TrackRow {
    fn from_record(number: usize, track: &TrackRecord) -> Self {
        let spotify_url = track.external_urls.spotify.clone().or_else(|| {
            track
                .id
                .as_ref()
                .map(|id| format!("{TRACK_URL_BASE}{id}"))
        });

        Self {
            number,
            track_id: track.id.clone(),
            title: track.name.clone(),
            album: track
                .album
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            preview_url: track.preview_url.clone().filter(|u| !u.is_empty()),
            spotify_url,
            favorite: false,
        }
    }

    #[must_use]
    pub const fn has_preview(&self) -> bool {
        self.preview_url.is_some()
    }

    /// Metadata stored when this row is favorited.
    #[must_use]
    pub fn favorite_metadata(&self) -> FavoriteMetadata {
        FavoriteMetadata::with_preview(self.preview_url.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistPageKind {
    /// Fetched from the catalog
    Loaded,
    /// Synthesized from the requested name after a failure or empty search
    Demo,
    /// Nothing was requested
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistPage {
    pub kind: ArtistPageKind,
    pub profile: Option<ArtistProfile>,
    pub tracks: Vec<TrackRow>,
    pub notice: Option<String>,
    pub from_home: bool,
}

impl ArtistPage {
    fn default_page(from_home: bool) -> Self {
        Self {
            kind: ArtistPageKind::Default,
            profile: None,
            tracks: Vec::new(),
            notice: None,
            from_home,
        }
    }

    fn demo(name: &str, from_home: bool) -> Self {
        Self {
            kind: ArtistPageKind::Demo,
            profile: Some(ArtistProfile {
                id: None,
                name: name.to_string(),
                image_url: NO_IMAGE_DATA_URI.to_string(),
                followers_label: "Demo Artist".to_string(),
                genre_label: "Music".to_string(),
            }),
            tracks: vec![TrackRow {
                number: 1,
                track_id: None,
                title: "Popular Track 1".to_string(),
                album: String::new(),
                preview_url: None,
                spotify_url: None,
                favorite: false,
            }],
            notice: None,
            from_home,
        }
    }

    fn loaded(artist: &ArtistRecord, tracks: &[TrackRecord], from_home: bool) -> Self {
        Self {
            kind: ArtistPageKind::Loaded,
            profile: Some(ArtistProfile {
                id: Some(artist.id.clone()),
                name: artist.name.clone(),
                image_url: artist
                    .primary_image()
                    .unwrap_or(NO_IMAGE_DATA_URI)
                    .to_string(),
                followers_label: format!(
                    "{} Followers",
                    format_followers(artist.followers.map_or(0, |f| f.total))
                ),
                genre_label: genre_label(&artist.genres),
            }),
            tracks: tracks
                .iter()
                .enumerate()
                .map(|(i, t)| TrackRow::from_record(i + 1, t))
                .collect(),
            notice: None,
            from_home,
        }
    }

    #[must_use]
    pub fn artist_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.name.as_str())
    }

    /// Refresh the favorite flag on every row.
    pub async fn sync_favorites(&mut self, favorites: &FavoritesStore) {
        let Some(artist) = self.profile.as_ref().map(|p| p.name.clone()) else {
            return;
        };
        for row in &mut self.tracks {
            row.favorite = match favorites.is_favorite(&artist, &row.title).await {
                Ok(saved) => saved,
                Err(e) => {
                    warn!("Could not read favorite state for {}: {}", row.title, e);
                    false
                }
            };
        }
    }
}

/// `1.2M`, `3.4K`, or the plain count.
#[must_use]
pub fn format_followers(count: u64) -> String {
    fn tenths(count: u64, unit: u64) -> String {
        let scaled = count.saturating_add(unit / 20) / (unit / 10);
        format!("{}.{}", scaled / 10, scaled % 10)
    }

    if count >= 1_000_000 {
        format!("{}M", tenths(count, 1_000_000))
    } else if count >= 1_000 {
        format!("{}K", tenths(count, 1_000))
    } else {
        count.to_string()
    }
}

/// First genre with its first letter upper-cased, or `Various Genres`.
#[must_use]
pub fn genre_label(genres: &[String]) -> String {
    let Some(primary) = genres.first().filter(|g| !g.is_empty()) else {
        return "Various Genres".to_string();
    };
    let mut chars = primary.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Load the page for `request`.
///
/// An id other than [`DEMO_ARTIST_ID`] loads the artist and top tracks
/// concurrently; otherwise a name is searched and its first match loaded.
/// Failures fall back to a demo page when a name is known.
pub async fn load_artist_page(
    catalog: &dyn CatalogClient,
    favorites: Option<&FavoritesStore>,
    request: &ArtistPageRequest,
) -> ArtistPage {
    let name = request.artist_name.as_deref();
    let from_home = request.from_home;

    let mut page = match request.artist_id.as_deref() {
        Some(id) if id != DEMO_ARTIST_ID => load_by_id(catalog, id, name, from_home).await,
        _ => match name {
            Some(name) => load_by_name(catalog, name, from_home).await,
            None => {
                info!("No artist requested, showing default page");
                ArtistPage::default_page(from_home)
            }
        },
    };

    if let Some(favorites) = favorites {
        page.sync_favorites(favorites).await;
    }
    page
}

async fn fetch_artist(
    catalog: &dyn CatalogClient,
    id: &str,
) -> Result<(ArtistRecord, Vec<TrackRecord>), CatalogError> {
    let (artist, top_tracks) =
        futures::join!(catalog.get_artist(id), catalog.get_artist_top_tracks(id));
    Ok((artist?, top_tracks?.tracks))
}

async fn load_by_id(
    catalog: &dyn CatalogClient,
    id: &str,
    fallback_name: Option<&str>,
    from_home: bool,
) -> ArtistPage {
    info!("Loading artist {}", id);
    match fetch_artist(catalog, id).await {
        Ok((artist, tracks)) => {
            info!("Loaded {} with {} top tracks", artist.name, tracks.len());
            ArtistPage::loaded(&artist, &tracks, from_home)
        }
        Err(e) => {
            warn!("Error loading artist {}: {}", id, e);
            let mut page = fallback_name.map_or_else(
                || ArtistPage::default_page(from_home),
                |name| ArtistPage::demo(name, from_home),
            );
            page.notice = Some(MSG_LOAD_FAILED.to_string());
            page
        }
    }
}

async fn load_by_name(catalog: &dyn CatalogClient, name: &str, from_home: bool) -> ArtistPage {
    info!("Searching artist by name {:?}", name);
    match catalog.search_artists(name).await {
        Ok(found) => match found.artists.items.first() {
            Some(artist) => load_by_id(catalog, &artist.id, Some(name), from_home).await,
            None => {
                info!("No artist named {:?}, showing demo page", name);
                ArtistPage::demo(name, from_home)
            }
        },
        Err(e) => {
            warn!("Error searching artist {:?}: {}", name, e);
            let mut page = ArtistPage::demo(name, from_home);
            page.notice = Some(MSG_LOAD_FAILED.to_string());
            page
        }
    }
}
