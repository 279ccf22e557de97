//! Interactive browsing loop.
//!
//! Reads one command per line, feeds it to the navigation session, the
//! artist page, the favorites store or the preview player, and prints the
//! result. Numbers typed by the user are 1-based.

use crate::render::{self, control_id};
use chrono::Utc;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vibecheck_core::{
    load_artist_page, AnimationDriver, ArtistPage, AudioPreviewController, CoreError,
    FavoritesStore, FavoritesView, Navigator, PlayOutcome, Screen,
};

/// How often the player is checked for a finished clip
const PLAYER_POLL_MS: u64 = 250;

const HELP: &str = "\
Commands:
  popular            random popular artists
  genre <name>       browse a genre
  next | prev        page through the genre
  search <term>      search artists by name
  open <n>           open artist n
  back               return to the previous view
  play <n>           play or pause the preview of track n
  stop               stop playback
  fav <n>            toggle favorite on track n (removes n in the favorites list)
  spotify <n>        open track n on Spotify
  favorites          list saved tracks
  help               this text
  quit               leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Popular,
    Genre(String),
    Next,
    Previous,
    Search(String),
    Open(usize),
    Back,
    Play(usize),
    Stop,
    Favorite(usize),
    Spotify(usize),
    Favorites,
    Help,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let index = || -> Result<usize, String> {
            match rest.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(n - 1),
                _ => Err(format!("`{word}` needs a number starting at 1")),
            }
        };

        match word.to_lowercase().as_str() {
            "popular" | "home" => Ok(Self::Popular),
            "genre" if !rest.is_empty() => Ok(Self::Genre(rest.to_string())),
            "genre" => Err("`genre` needs a genre name".into()),
            "next" | "n" => Ok(Self::Next),
            "prev" | "previous" | "p" => Ok(Self::Previous),
            // Empty terms reach the session, which answers with its own notice
            "search" | "s" => Ok(Self::Search(rest.to_string())),
            "open" | "o" => index().map(Self::Open),
            "back" | "b" => Ok(Self::Back),
            "play" => index().map(Self::Play),
            "stop" => Ok(Self::Stop),
            "fav" | "f" => index().map(Self::Favorite),
            "spotify" => index().map(Self::Spotify),
            "favorites" | "favs" => Ok(Self::Favorites),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "" => Err(String::new()),
            other => Err(format!("Unknown command `{other}`. Type `help`.")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What the numbered items on screen refer to.
#[derive(Debug)]
enum Focus {
    Home,
    Artist(ArtistPage),
    Favorites,
}

pub struct BrowseSession {
    navigator: Navigator,
    favorites: FavoritesView,
    player: AudioPreviewController,
    animations: Arc<dyn AnimationDriver>,
    focus: Focus,
    /// Keys of the favorites list last printed
    shown_favorites: Vec<String>,
}

impl BrowseSession {
    /// # Errors
    ///
    /// Returns an error if the favorites listing cannot be read.
    pub async fn new(
        navigator: Navigator,
        favorites: FavoritesStore,
        player: AudioPreviewController,
        animations: Arc<dyn AnimationDriver>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            navigator,
            favorites: FavoritesView::open(favorites).await?,
            player,
            animations,
            focus: Focus::Home,
            shown_favorites: Vec::new(),
        })
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// Returns an error if the favorites storage fails.
    pub async fn handle(&mut self, command: BrowseCommand) -> Result<Flow, CoreError> {
        match command {
            BrowseCommand::Popular => {
                let screen = self.navigator.popular().await;
                self.show_home(&screen).await;
            }
            BrowseCommand::Genre(genre) => {
                let screen = self.navigator.genre(&genre).await;
                self.show_home(&screen).await;
            }
            BrowseCommand::Next => {
                let screen = self.navigator.next().await;
                self.show_home(&screen).await;
            }
            BrowseCommand::Previous => {
                let screen = self.navigator.previous().await;
                self.show_home(&screen).await;
            }
            BrowseCommand::Search(term) => {
                let screen = self.navigator.search(&term).await;
                self.show_home(&screen).await;
            }
            BrowseCommand::Open(index) => self.open(index).await,
            BrowseCommand::Back => {
                let screen = self.navigator.back().await;
                self.show_home(&screen).await;
            }
            BrowseCommand::Play(index) => self.play(index),
            BrowseCommand::Stop => {
                self.player.stop();
                println!("Stopped.");
            }
            BrowseCommand::Favorite(index) => self.favorite(index).await?,
            BrowseCommand::Spotify(index) => self.open_on_spotify(index),
            BrowseCommand::Favorites => {
                self.favorites.refresh().await?;
                self.leave_artist_page();
                self.focus = Focus::Favorites;
                self.show_favorites();
            }
            BrowseCommand::Help => println!("{HELP}"),
            BrowseCommand::Quit => {
                self.player.stop();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Detect the natural end of a preview.
    pub fn tick(&mut self) {
        let title = self.player.now_playing().map(ToString::to_string);
        if self.player.poll() {
            if let Some(title) = title {
                println!("Preview of \"{title}\" finished.");
            }
        }
    }

    /// Answer a change notification from the favorites storage.
    /// Re-read a stale favorites listing and update whatever shows it.
    /// A failed re-read leaves the listing stale for the next attempt.
    async fn reload_favorites(&mut self) {
        match self.favorites.refresh().await {
            Ok(true) => self.favorites_changed().await,
            Ok(false) => {}
            Err(e) => warn!("Failed to reload favorites: {}", e),
        }
    }

    async fn favorites_changed(&mut self) {
        match &mut self.focus {
            Focus::Favorites => {
                if self.favorite_keys() != self.shown_favorites {
                    println!("Favorites changed:");
                    self.show_favorites();
                }
            }
            Focus::Artist(page) => page.sync_favorites(self.favorites.store()).await,
            Focus::Home => {}
        }
    }

    fn favorite_keys(&self) -> Vec<String> {
        self.favorites.entries().iter().map(|e| e.key.clone()).collect()
    }

    fn show_favorites(&mut self) {
        render::print_favorites(self.favorites.entries(), Utc::now());
        self.shown_favorites = self.favorite_keys();
    }

    async fn show_home(&mut self, screen: &Screen) {
        self.leave_artist_page();
        self.focus = Focus::Home;
        render::print_screen(screen, self.animations.as_ref()).await;
    }

    fn leave_artist_page(&mut self) {
        if matches!(self.focus, Focus::Artist(_)) {
            self.player.stop();
        }
    }

    async fn open(&mut self, index: usize) {
        if !matches!(self.focus, Focus::Home) {
            println!("`open` works on the artist list. Type `back` first.");
            return;
        }
        let Some(request) = self.navigator.open_artist(index) else {
            println!("No artist #{}.", index + 1);
            return;
        };

        let catalog = self.navigator.catalog();
        let page =
            load_artist_page(catalog.as_ref(), Some(self.favorites.store()), &request).await;
        render::print_artist_page(&page, &self.player, self.animations.as_ref()).await;
        self.focus = Focus::Artist(page);
    }

    fn play(&mut self, index: usize) {
        let (source, control, title) = match &self.focus {
            Focus::Artist(page) => {
                let Some(row) = page.tracks.get(index) else {
                    println!("No track #{}.", index + 1);
                    return;
                };
                (row.preview_url.clone(), control_id(row), row.title.clone())
            }
            Focus::Favorites => {
                let Some(entry) = self.favorites.entries().get(index) else {
                    println!("No favorite #{}.", index + 1);
                    return;
                };
                (entry.preview_url.clone(), entry.key.clone(), entry.title.clone())
            }
            Focus::Home => {
                println!("Open an artist or the favorites list to play previews.");
                return;
            }
        };

        match self.player.play(source.as_deref(), &control, &title) {
            PlayOutcome::Started => println!("Playing \"{title}\"."),
            PlayOutcome::Paused => println!("Paused \"{title}\"."),
            PlayOutcome::NoPreview | PlayOutcome::Failed => {
                if let Some(message) = self.player.notices().latest() {
                    println!("(!) {message}");
                }
            }
        }
    }

    async fn favorite(&mut self, index: usize) -> Result<(), CoreError> {
        match &mut self.focus {
            Focus::Artist(page) => {
                let Some(artist) = page.artist_name().map(ToString::to_string) else {
                    println!("No artist loaded.");
                    return Ok(());
                };
                let Some(row) = page.tracks.get_mut(index) else {
                    println!("No track #{}.", index + 1);
                    return Ok(());
                };
                let saved = self
                    .favorites
                    .store()
                    .toggle_favorite(&artist, &row.title, &row.favorite_metadata())
                    .await?;
                row.favorite = saved;
                if saved {
                    println!("Saved \"{}\" to favorites.", row.title);
                } else {
                    println!("Removed \"{}\" from favorites.", row.title);
                }
            }
            Focus::Favorites => {
                let Some(entry) = self.favorites.entries().get(index).cloned() else {
                    println!("No favorite #{}.", index + 1);
                    return Ok(());
                };
                if self.player.control_state(&entry.key) == vibecheck_core::ControlState::Playing {
                    self.player.stop();
                }
                self.favorites.remove(&entry.key).await?;
                println!("Removed \"{}\" from favorites.", entry.title);
                self.show_favorites();
            }
            Focus::Home => println!("Open an artist to save tracks."),
        }
        Ok(())
    }

    fn open_on_spotify(&self, index: usize) {
        let Focus::Artist(page) = &self.focus else {
            println!("Open an artist to listen on Spotify.");
            return;
        };
        let Some(url) = page.tracks.get(index).and_then(|r| r.spotify_url.as_deref()) else {
            println!("No Spotify link for track #{}.", index + 1);
            return;
        };
        info!("Opening {}", url);
        if let Err(e) = open::that(url) {
            warn!("Failed to open {}: {}", url, e);
            println!("Could not open a browser. Link: {url}");
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Run until `quit`, end of input, or cancellation.
///
/// # Errors
///
/// Returns an error if reading input or the favorites storage fails.
pub async fn run(
    mut session: BrowseSession,
    cancel_token: CancellationToken,
) -> Result<(), CoreError> {
    println!("{HELP}\n");
    session.handle(BrowseCommand::Popular).await?;
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut player_poll = tokio::time::interval(Duration::from_millis(PLAYER_POLL_MS));
    let mut favorites_live = true;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Browse session cancelled");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.parse::<BrowseCommand>() {
                    Ok(command) => {
                        if session.handle(command).await? == Flow::Quit {
                            break;
                        }
                    }
                    Err(message) if message.is_empty() => {}
                    Err(message) => println!("{message}"),
                }
                prompt();
            }
            _ = player_poll.tick() => session.tick(),
            live = session.favorites.wait_for_change(), if favorites_live => {
                if live {
                    session.reload_favorites().await;
                } else {
                    favorites_live = false;
                }
            }
        }
    }

    session.player.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use vibecheck_core::catalog::{
        AlbumRef, ArtistRecord, ArtistSearchResponse, CatalogClient, ExternalUrls,
        SeveralArtistsResponse, TopTracksResponse, TrackRecord, TrackSearchResponse,
    };
    use vibecheck_core::{
        AudioBackend, CatalogError, ControlState, KeyValueStorage, MemoryStorage, NoopAnimations, NoticeBoard,
        PreviewError, SessionConfig,
    };

    #[test]
    fn test_parse_commands() {
        let parse = |line: &str| line.parse::<BrowseCommand>();
        assert_eq!(parse("genre  R&B "), Ok(BrowseCommand::Genre("R&B".into())));
        assert_eq!(parse("open 2"), Ok(BrowseCommand::Open(1)));
        assert_eq!(parse("PLAY 1"), Ok(BrowseCommand::Play(0)));
        assert_eq!(parse("search"), Ok(BrowseCommand::Search(String::new())));
        assert_eq!(parse("q"), Ok(BrowseCommand::Quit));
        assert!(parse("open 0").is_err());
        assert!(parse("open x").is_err());
        assert!(parse("genre").is_err());
        assert_eq!(parse("   "), Err(String::new()));
    }

    struct OneArtistCatalog {
        artist: ArtistRecord,
        tracks: Vec<TrackRecord>,
    }

    #[async_trait]
    impl CatalogClient for OneArtistCatalog {
        async fn search_artists(&self, _query: &str) -> Result<ArtistSearchResponse, CatalogError> {
            let mut response = ArtistSearchResponse::default();
            response.artists.items.push(self.artist.clone());
            Ok(response)
        }

        async fn search_by_genre(&self, _genre: &str) -> Result<TrackSearchResponse, CatalogError> {
            Ok(TrackSearchResponse::default())
        }

        async fn get_artist(&self, _id: &str) -> Result<ArtistRecord, CatalogError> {
            Ok(self.artist.clone())
        }

        async fn get_artist_top_tracks(&self, _id: &str) -> Result<TopTracksResponse, CatalogError> {
            Ok(TopTracksResponse {
                tracks: self.tracks.clone(),
            })
        }

        async fn get_several_artists(
            &self,
            _ids: &[String],
        ) -> Result<SeveralArtistsResponse, CatalogError> {
            Ok(SeveralArtistsResponse::default())
        }
    }

    /// Records started sources; never finishes on its own.
    #[derive(Clone, Default)]
    struct RecordingBackend {
        started: Arc<Mutex<Vec<String>>>,
        stops: Arc<Mutex<usize>>,
    }

    impl AudioBackend for RecordingBackend {
        fn start(&mut self, source_url: &str) -> Result<(), PreviewError> {
            self.started.lock().unwrap().push(source_url.to_string());
            Ok(())
        }

        fn stop(&mut self) {
            *self.stops.lock().unwrap() += 1;
        }

        fn has_finished(&mut self) -> bool {
            false
        }
    }

    fn track(id: &str, name: &str, preview: Option<&str>) -> TrackRecord {
        TrackRecord {
            id: Some(id.into()),
            name: name.into(),
            artists: Vec::new(),
            album: Some(AlbumRef {
                name: "Discovery".into(),
                images: Vec::new(),
            }),
            preview_url: preview.map(String::from),
            external_urls: ExternalUrls::default(),
        }
    }

    async fn session() -> (BrowseSession, FavoritesStore, RecordingBackend) {
        session_over(MemoryStorage::new()).await
    }

    async fn session_over(
        storage: MemoryStorage,
    ) -> (BrowseSession, FavoritesStore, RecordingBackend) {
        let catalog = OneArtistCatalog {
            artist: ArtistRecord {
                id: "dp".into(),
                name: "Daft Punk".into(),
                images: Vec::new(),
                genres: vec!["french house".into()],
                followers: None,
                popularity: None,
                external_urls: ExternalUrls::default(),
            },
            tracks: vec![
                track("t1", "One More Time", Some("https://p.scdn.co/1")),
                track("t2", "Aerodynamic", None),
            ],
        };
        let navigator = Navigator::new(Arc::new(catalog), SessionConfig::default());
        let favorites = FavoritesStore::new(Arc::new(storage));
        let backend = RecordingBackend::default();
        let player = AudioPreviewController::new(Box::new(backend.clone()), NoticeBoard::default());
        let session = BrowseSession::new(navigator, favorites.clone(), player, Arc::new(NoopAnimations))
            .await
            .unwrap();
        (session, favorites, backend)
    }

    #[tokio::test]
    async fn test_search_open_play_and_favorite() {
        let (mut session, favorites, backend) = session().await;

        session.handle(BrowseCommand::Search("Daft Punk".into())).await.unwrap();
        session.handle(BrowseCommand::Open(0)).await.unwrap();
        assert!(matches!(session.focus, Focus::Artist(ref p) if p.tracks.len() == 2));

        session.handle(BrowseCommand::Play(0)).await.unwrap();
        assert_eq!(session.player.control_state("t1"), ControlState::Playing);
        assert_eq!(*backend.started.lock().unwrap(), vec!["https://p.scdn.co/1"]);

        // Pressing the same control pauses it
        session.handle(BrowseCommand::Play(0)).await.unwrap();
        assert_eq!(session.player.control_state("t1"), ControlState::Idle);

        session.handle(BrowseCommand::Favorite(0)).await.unwrap();
        assert!(favorites.is_favorite("Daft Punk", "One More Time").await.unwrap());
        assert!(matches!(session.focus, Focus::Artist(ref p) if p.tracks[0].favorite));

        session.handle(BrowseCommand::Favorite(0)).await.unwrap();
        assert!(!favorites.is_favorite("Daft Punk", "One More Time").await.unwrap());
    }

    #[tokio::test]
    async fn test_track_without_preview_posts_notice() {
        let (mut session, _, backend) = session().await;
        session.handle(BrowseCommand::Search("Daft Punk".into())).await.unwrap();
        session.handle(BrowseCommand::Open(0)).await.unwrap();

        session.handle(BrowseCommand::Play(1)).await.unwrap();
        assert!(backend.started.lock().unwrap().is_empty());
        assert_eq!(
            session.player.notices().latest(),
            Some("No preview available for \"Aerodynamic\"")
        );
    }

    #[tokio::test]
    async fn test_leaving_artist_page_stops_preview() {
        let (mut session, _, _) = session().await;
        session.handle(BrowseCommand::Search("Daft Punk".into())).await.unwrap();
        session.handle(BrowseCommand::Open(0)).await.unwrap();
        session.handle(BrowseCommand::Play(0)).await.unwrap();

        session.handle(BrowseCommand::Back).await.unwrap();
        assert!(session.player.now_playing().is_none());
        assert!(matches!(session.focus, Focus::Home));
    }

    #[tokio::test]
    async fn test_favorites_list_remove() {
        let (mut session, favorites, _) = session().await;
        favorites
            .set_favorite("Drake", "Track A", &vibecheck_core::FavoriteMetadata::default())
            .await
            .unwrap();

        session.handle(BrowseCommand::Favorites).await.unwrap();
        assert_eq!(session.favorites.entries().len(), 1);

        session.handle(BrowseCommand::Favorite(0)).await.unwrap();
        assert!(session.favorites.is_empty());
        assert!(!favorites.is_favorite("Drake", "Track A").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_requires_home_focus() {
        let (mut session, _, _) = session().await;
        session.handle(BrowseCommand::Favorites).await.unwrap();
        session.handle(BrowseCommand::Open(0)).await.unwrap();
        assert!(matches!(session.focus, Focus::Favorites));

        let flow = session.handle(BrowseCommand::Quit).await.unwrap();
        assert_eq!(flow, Flow::Quit);
    }

    #[tokio::test]
    async fn test_external_change_reaches_favorites_list() {
        let storage = MemoryStorage::new();
        let (mut session, _, _) = session_over(storage.clone()).await;
        session.handle(BrowseCommand::Favorites).await.unwrap();
        assert!(session.shown_favorites.is_empty());

        // Another process writes the row; the watcher only reports a change
        let other = FavoritesStore::new(Arc::new(storage.clone()));
        other
            .set_favorite("Drake", "Track A", &vibecheck_core::FavoriteMetadata::default())
            .await
            .unwrap();
        storage.notify_external_change();

        // The player poll wins the first round of the loop
        tokio::select! {
            biased;
            () = std::future::ready(()) => session.tick(),
            _ = session.favorites.wait_for_change() => {}
        }

        assert!(session.favorites.wait_for_change().await);
        session.reload_favorites().await;
        assert_eq!(session.favorites.entries().len(), 1);
        assert_eq!(session.shown_favorites, vec!["fav_Drake_Track A".to_string()]);
        assert!(!session.favorites.is_stale());
    }

    #[tokio::test]
    async fn test_external_change_syncs_open_artist_page() {
        let storage = MemoryStorage::new();
        let (mut session, _, _) = session_over(storage.clone()).await;
        session.handle(BrowseCommand::Search("Daft Punk".into())).await.unwrap();
        session.handle(BrowseCommand::Open(0)).await.unwrap();

        let other = FavoritesStore::new(Arc::new(storage.clone()));
        other
            .set_favorite("Daft Punk", "Aerodynamic", &vibecheck_core::FavoriteMetadata::default())
            .await
            .unwrap();

        assert!(session.favorites.wait_for_change().await);
        session.reload_favorites().await;
        assert!(matches!(session.focus, Focus::Artist(ref p) if p.tracks[1].favorite));
    }

    #[test]
    fn test_unknown_command_message() {
        let err = "dance".parse::<BrowseCommand>().unwrap_err();
        assert!(err.contains("Unknown command `dance`"));
    }
}
