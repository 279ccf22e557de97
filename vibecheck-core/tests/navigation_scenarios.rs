use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use vibecheck_core::catalog::{
    AlbumRef, ArtistRecord, ArtistSearchResponse, CatalogClient, ExternalUrls, Paging,
    SeveralArtistsResponse, SimplifiedArtist, TopTracksResponse, TrackRecord, TrackSearchResponse,
};
use vibecheck_core::navigation::{refinement_terms, Fetch, NavState, NoticeKind, Step};
use vibecheck_core::{
    load_artist_page, ArtistPageKind, ArtistPageRequest, CatalogError, FavoriteMetadata,
    FavoritesStore, KeyValueStorage, NavigationSession, Navigator, SessionConfig, SqliteStorage,
};

/// Catalog answering from fixed tables.
#[derive(Default)]
struct ScriptedCatalog {
    artists: HashMap<String, ArtistRecord>,
    searches: HashMap<String, Vec<String>>,
    genre_tracks: HashMap<String, Vec<TrackRecord>>,
    top_tracks: HashMap<String, Vec<TrackRecord>>,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<String>>,
}

fn server_error(operation: &'static str) -> CatalogError {
    CatalogError::Http {
        operation,
        status: 500,
    }
}

impl ScriptedCatalog {
    fn with_artists(ids: &[&str]) -> Self {
        let mut catalog = Self::default();
        for id in ids {
            catalog.add_artist(id);
        }
        catalog
    }

    fn add_artist(&mut self, id: &str) {
        self.artists.insert(
            id.to_string(),
            ArtistRecord {
                id: id.to_string(),
                name: format!("Artist {id}"),
                images: Vec::new(),
                genres: vec!["electro".to_string()],
                followers: None,
                popularity: None,
                external_urls: ExternalUrls::default(),
            },
        );
    }

    fn search(mut self, query: &str, ids: &[&str]) -> Self {
        for id in ids {
            if !self.artists.contains_key(*id) {
                self.add_artist(id);
            }
        }
        self.searches
            .insert(query.to_string(), ids.iter().map(ToString::to_string).collect());
        self
    }

    fn genre(mut self, genre: &str, artist_ids: &[&str]) -> Self {
        let tracks = artist_ids.iter().map(|id| track(id, None)).collect();
        self.genre_tracks.insert(genre.to_string(), tracks);
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, ids: &[String]) -> Vec<ArtistRecord> {
        ids.iter().filter_map(|id| self.artists.get(id).cloned()).collect()
    }
}

fn track(artist_id: &str, preview: Option<&str>) -> TrackRecord {
    TrackRecord {
        id: Some(format!("track-{artist_id}")),
        name: format!("Song by {artist_id}"),
        artists: vec![SimplifiedArtist {
            id: Some(artist_id.to_string()),
            name: artist_id.to_string(),
        }],
        album: Some(AlbumRef {
            name: "LP".to_string(),
            images: Vec::new(),
        }),
        preview_url: preview.map(ToString::to_string),
        external_urls: ExternalUrls::default(),
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn search_artists(&self, query: &str) -> Result<ArtistSearchResponse, CatalogError> {
        self.record(format!("search {query}"));
        if self.failing.contains("search") {
            return Err(server_error("Search"));
        }
        let ids = self.searches.get(query).cloned().unwrap_or_default();
        Ok(ArtistSearchResponse {
            artists: Paging {
                items: self.lookup(&ids),
                total: None,
            },
        })
    }

    async fn search_by_genre(&self, genre: &str) -> Result<TrackSearchResponse, CatalogError> {
        self.record(format!("genre {genre}"));
        Ok(TrackSearchResponse {
            tracks: Paging {
                items: self.genre_tracks.get(genre).cloned().unwrap_or_default(),
                total: None,
            },
        })
    }

    async fn get_artist(&self, id: &str) -> Result<ArtistRecord, CatalogError> {
        self.record(format!("artist {id}"));
        if self.failing.contains("artist") {
            return Err(server_error("Get artist"));
        }
        self.artists.get(id).cloned().ok_or(CatalogError::Http {
            operation: "Get artist",
            status: 404,
        })
    }

    async fn get_artist_top_tracks(&self, id: &str) -> Result<TopTracksResponse, CatalogError> {
        self.record(format!("top-tracks {id}"));
        Ok(TopTracksResponse {
            tracks: self.top_tracks.get(id).cloned().unwrap_or_default(),
        })
    }

    async fn get_several_artists(
        &self,
        ids: &[String],
    ) -> Result<SeveralArtistsResponse, CatalogError> {
        self.record(format!("several {}", ids.join(",")));
        Ok(SeveralArtistsResponse {
            artists: self.lookup(ids),
        })
    }
}

fn navigator(catalog: ScriptedCatalog) -> Navigator {
    let session = NavigationSession::with_seed(SessionConfig::default(), 11);
    Navigator::with_session(Arc::new(catalog), session)
}

fn card_ids(screen: &vibecheck_core::Screen) -> Vec<String> {
    screen.artists.iter().map(|a| a.id.clone()).collect()
}

#[tokio::test]
async fn test_next_then_previous_returns_to_start() {
    let mut catalog = ScriptedCatalog::default().genre("Jazz", &["j1", "j2", "j1", "j3"]);
    for (i, term) in refinement_terms("Jazz").iter().enumerate() {
        let page: Vec<String> = (0..3).map(|n| format!("{term}-{i}-{n}")).collect();
        let refs: Vec<&str> = page.iter().map(String::as_str).collect();
        catalog = catalog.search(&format!("genre:Jazz {term}"), &refs);
    }
    for id in ["j1", "j2", "j3"] {
        catalog.add_artist(id);
    }

    let mut nav = navigator(catalog);
    let start = nav.genre("Jazz").await;
    assert_eq!(card_ids(&start), vec!["j1", "j2", "j3"]);

    let mut pages = vec![card_ids(&start)];
    for _ in 0..3 {
        let shown = nav.next().await;
        assert!(shown.notice.is_none());
        pages.push(card_ids(&shown));
    }
    assert_eq!(nav.session().genre_pages().len(), 4);

    for expected in pages.iter().rev().skip(1) {
        let shown = nav.previous().await;
        assert_eq!(&card_ids(&shown), expected);
    }
    assert_eq!(nav.session().genre_pages().len(), 1);

    // At the floor, previous replays the first page
    let shown = nav.previous().await;
    assert_eq!(card_ids(&shown), vec!["j1", "j2", "j3"]);
    assert_eq!(shown.state, NavState::GenreBrowsing("Jazz".into()));
}

#[tokio::test]
async fn test_popular_renders_in_drawn_order() {
    let ids: Vec<&str> = vibecheck_core::navigation::POPULAR_ARTISTS
        .iter()
        .map(|(id, _)| *id)
        .collect();
    let catalog = ScriptedCatalog::with_artists(&ids);
    let mut session = NavigationSession::with_seed(SessionConfig::default(), 5);

    let Step::Fetch(request) = session.begin_popular() else {
        panic!("popular must fetch");
    };
    let Fetch::SeveralArtists { ids: drawn } = request.fetch.clone() else {
        panic!("popular uses the several-artists lookup");
    };

    let outcome = request.fetch.run(&catalog).await;
    let Step::Render(screen) = session.complete(request.ticket, outcome) else {
        panic!("popular renders after one fetch");
    };
    assert_eq!(card_ids(&screen), drawn);
}

#[tokio::test]
async fn test_genre_with_no_usable_ids_is_empty_state() {
    let mut nav = navigator(ScriptedCatalog::default().genre("Jazz", &[]));
    let shown = nav.genre("Jazz").await;

    assert_eq!(shown.state, NavState::GenreBrowsing("Jazz".into()));
    assert!(shown.artists.is_empty());
    let notice = shown.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::Empty);
    assert!(notice.message.contains("Jazz"));
}

#[tokio::test]
async fn test_history_keeps_last_ten_views() {
    let mut catalog = ScriptedCatalog::default();
    for i in 1..=12 {
        let id = format!("a{i}");
        catalog = catalog.search(&format!("q{i}"), &[id.as_str()]);
    }
    let mut nav = navigator(catalog);

    for i in 1..=12 {
        nav.search(&format!("q{i}")).await;
    }
    // Searches 1..=11 were pushed when leaving them; the first fell off
    let history = nav.session().history();
    assert_eq!(history.len(), 10);
    assert_eq!(history.iter().next().unwrap().search_term, "q2");

    let restored = nav.back().await;
    assert_eq!(restored.state, NavState::SearchResults("q11".into()));
    assert_eq!(card_ids(&restored), vec!["a11"]);
}

#[tokio::test]
async fn test_search_then_open_first_match() {
    let mut catalog = ScriptedCatalog::default().search("Daft Punk", &["dp", "dp-tribute"]);
    catalog
        .top_tracks
        .insert("dp".into(), vec![track("dp", Some("https://p.scdn.co/dp"))]);
    let mut nav = navigator(catalog);

    let shown = nav.search("Daft Punk").await;
    assert_eq!(card_ids(&shown), vec!["dp", "dp-tribute"]);

    let request = nav.open_artist(0).unwrap();
    assert_eq!(request.artist_id.as_deref(), Some("dp"));
    assert_eq!(nav.session().state(), NavState::ArtistDetail("dp".into()));

    let saved = nav.session().history().iter().last().unwrap();
    assert_eq!(saved.kind(), NavState::SearchResults("Daft Punk".into()));

    let catalog = nav.catalog();
    let page = load_artist_page(catalog.as_ref(), None, &request).await;
    assert_eq!(page.kind, ArtistPageKind::Loaded);
    assert_eq!(page.tracks.len(), 1);
    assert!(page.tracks[0].has_preview());
    assert_eq!(page.profile.unwrap().genre_label, "Electro");

    // Back restores the exact result ordering
    let restored = nav.back().await;
    assert_eq!(card_ids(&restored), vec!["dp", "dp-tribute"]);
}

#[tokio::test]
async fn test_search_failure_surfaces_message() {
    let mut catalog = ScriptedCatalog::default();
    catalog.failing.insert("search");
    let mut nav = navigator(catalog);

    let shown = nav.search("anything").await;
    let notice = shown.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "Error searching for artists. Please try again.");
}

#[tokio::test]
async fn test_artist_page_falls_back_to_demo() {
    let mut catalog = ScriptedCatalog::with_artists(&["x"]);
    catalog.failing.insert("artist");

    let request = ArtistPageRequest::from_query("artistId=x&artistName=Xavier");
    let page = load_artist_page(&catalog, None, &request).await;
    assert_eq!(page.kind, ArtistPageKind::Demo);
    assert_eq!(page.tracks[0].title, "Popular Track 1");
    assert_eq!(
        page.notice.as_deref(),
        Some("Error loading artist information. Please try again.")
    );

    // Artist and top tracks were requested together
    let calls = catalog.calls.lock().unwrap().clone();
    assert!(calls.contains(&"artist x".to_string()));
    assert!(calls.contains(&"top-tracks x".to_string()));
}

#[tokio::test]
async fn test_artist_page_by_name_and_default() {
    let catalog = ScriptedCatalog::default().search("Björk", &["bj"]);

    let page = load_artist_page(
        &catalog,
        None,
        &ArtistPageRequest::from_query("artistId=demo&artistName=Bj%C3%B6rk"),
    )
    .await;
    assert_eq!(page.kind, ArtistPageKind::Loaded);
    assert_eq!(page.artist_name(), Some("Artist bj"));

    let page = load_artist_page(&catalog, None, &ArtistPageRequest::default()).await;
    assert_eq!(page.kind, ArtistPageKind::Default);
}

#[tokio::test]
async fn test_favorites_flags_on_artist_page() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("kv.db")).await.unwrap();
    let favorites = FavoritesStore::new(Arc::new(storage.clone()));

    let mut catalog = ScriptedCatalog::with_artists(&["dr"]);
    catalog
        .top_tracks
        .insert("dr".into(), vec![track("dr", None), track("dr2", None)]);

    favorites
        .set_favorite("Artist dr", "Song by dr", &FavoriteMetadata::default())
        .await
        .unwrap();
    storage.set("fav_broken", "not json").await.unwrap();

    let request = ArtistPageRequest::for_artist("dr", "Drake");
    let page = load_artist_page(&catalog, Some(&favorites), &request).await;
    let flags: Vec<bool> = page.tracks.iter().map(|t| t.favorite).collect();
    assert_eq!(flags, vec![true, false]);

    // The malformed value does not break listing
    let listed = favorites.list_favorites().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].artist, "Artist dr");
}
