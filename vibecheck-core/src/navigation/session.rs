use super::genre::{extract_artist_ids, pick_refinement, GenrePageState, PageQuery};
use super::history::NavigationHistory;
use super::popular::{draw_popular_ids, placeholder_cards, POPULAR_LABEL};
use super::{
    Fetch, FetchOutcome, FetchResult, NavState, Notice, Request, Screen, Step, Ticket, ViewState,
};
use crate::artist::ArtistPageRequest;
use crate::catalog::ArtistRecord;
use crate::config::{BrowseConfig, DEFAULT_HISTORY_CAPACITY, DEFAULT_PAGE_SIZE};
use crate::error::CatalogError;
use crate::model::summarize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

const MSG_EMPTY_SEARCH_INPUT: &str = "Please enter an artist name";
const MSG_SEARCH_FAILED: &str = "Error searching for artists. Please try again.";
const MSG_SEARCH_EMPTY: &str = "No artists found. Try a different search.";
const MSG_NEXT_FAILED: &str = "Error loading more artists. Please try again.";
const MSG_PREVIOUS_FAILED: &str = "Error loading artists. Please try again.";
const MSG_POPULAR_FAILED: &str = "Error loading popular artists. Please try again.";

fn genre_failed_message(genre: &str) -> String {
    format!("No {genre} music found. Please try another genre.")
}

fn previous_empty_message(genre: &str) -> String {
    format!("No {genre} artists found. Try another genre.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Cards per genre page
    pub page_size: usize,
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl From<&BrowseConfig> for SessionConfig {
    fn from(config: &BrowseConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            history_capacity: config.history_capacity.max(1),
        }
    }
}

/// Which response a page load is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Track search, artist ids still to be resolved
    Tracks,
    /// Artist records
    Artists,
}

#[derive(Debug)]
enum Plan {
    Popular {
        ids: Vec<String>,
    },
    Search {
        term: String,
    },
    GenreSelect {
        genre: String,
        stage: Stage,
    },
    Next {
        genre: String,
        query: PageQuery,
        stage: Stage,
    },
    Previous {
        target: GenrePageState,
        stage: Stage,
    },
}

#[derive(Debug)]
struct Pending {
    ticket: Ticket,
    plan: Plan,
}

/// Result of feeding one response into a page load.
enum PageProgress {
    Loaded(Vec<ArtistRecord>),
    Continue(Fetch),
    Empty,
    Failed(CatalogError),
}

fn first_fetch(query: &PageQuery) -> (Fetch, Stage) {
    match query {
        PageQuery::GenreTracks { genre } => (
            Fetch::SearchByGenre {
                genre: genre.clone(),
            },
            Stage::Tracks,
        ),
        PageQuery::ArtistSearch { query } => (
            Fetch::SearchArtists {
                query: query.clone(),
            },
            Stage::Artists,
        ),
    }
}

/// Home page navigation state.
///
/// All fields that used to be page globals live here: the rendered view,
/// the genre page stack, the back history and the in-flight transition.
pub struct NavigationSession {
    config: SessionConfig,
    current: ViewState,
    history: NavigationHistory,
    genre_pages: Vec<GenrePageState>,
    detail: Option<String>,
    notice: Option<Notice>,
    pending: Option<Pending>,
    generation: u64,
    rng: StdRng,
}

impl NavigationSession {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic draws for popular ids and refinement terms.
    #[must_use]
    pub fn with_seed(config: SessionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SessionConfig, rng: StdRng) -> Self {
        Self {
            config,
            current: ViewState::default(),
            history: NavigationHistory::new(config.history_capacity),
            genre_pages: Vec::new(),
            detail: None,
            notice: None,
            pending: None,
            generation: 0,
            rng,
        }
    }

    #[must_use]
    pub fn state(&self) -> NavState {
        self.detail
            .as_ref()
            .map_or_else(|| self.current.kind(), |id| NavState::ArtistDetail(id.clone()))
    }

    #[must_use]
    pub const fn current_view(&self) -> &ViewState {
        &self.current
    }

    #[must_use]
    pub const fn history(&self) -> &NavigationHistory {
        &self.history
    }

    #[must_use]
    pub fn genre_pages(&self) -> &[GenrePageState] {
        &self.genre_pages
    }

    #[must_use]
    pub fn active_genre(&self) -> Option<&str> {
        self.current.genre.as_deref()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Snapshot for the render layer.
    #[must_use]
    pub fn screen(&self) -> Screen {
        let state = self.state();
        let heading = match self.current.kind() {
            NavState::GenreBrowsing(genre) => Some(format!("{genre} Artists")),
            NavState::Popular if !self.current.artists.is_empty() => {
                Some(format!("{POPULAR_LABEL} Artists"))
            }
            _ => None,
        };

        Screen {
            state,
            heading,
            artists: self.current.artists.clone(),
            notice: self.notice.clone(),
            loading: self.pending.is_some(),
            can_go_next: self.current.genre.is_some(),
            can_go_previous: self.current.genre.is_some() && self.genre_pages.len() > 1,
        }
    }

    /// Show a fresh random draw of popular artists.
    pub fn begin_popular(&mut self) -> Step {
        info!("Loading popular artists");
        self.detail = None;
        self.notice = None;
        self.genre_pages.clear();

        let ids = draw_popular_ids(&mut self.rng, self.config.page_size);
        let fetch = Fetch::SeveralArtists { ids: ids.clone() };
        self.issue(Plan::Popular { ids }, fetch)
    }

    /// Search artists by free text.
    pub fn begin_search(&mut self, term: &str) -> Step {
        let term = term.trim();
        if term.is_empty() {
            self.notice = Some(Notice::error(MSG_EMPTY_SEARCH_INPUT));
            return Step::Render(self.screen());
        }

        info!("Searching artists for {:?}", term);
        self.save_current();
        self.detail = None;
        self.notice = None;
        self.genre_pages.clear();

        let fetch = Fetch::SearchArtists {
            query: term.to_string(),
        };
        self.issue(
            Plan::Search {
                term: term.to_string(),
            },
            fetch,
        )
    }

    /// Switch the genre filter and load its first page.
    pub fn begin_genre(&mut self, genre: &str) -> Step {
        let genre = genre.trim();
        if genre.is_empty() {
            return Step::Render(self.screen());
        }

        info!("Selecting genre {}", genre);
        self.save_current();
        self.start_genre(genre.to_string())
    }

    fn start_genre(&mut self, genre: String) -> Step {
        self.detail = None;
        self.notice = None;
        self.genre_pages.clear();

        let (fetch, stage) = first_fetch(&PageQuery::genre_tracks(&genre));
        self.issue(Plan::GenreSelect { genre, stage }, fetch)
    }

    /// Load another page of the active genre with a random refinement term.
    pub fn begin_next(&mut self) -> Step {
        let Some(genre) = self.current.genre.clone() else {
            debug!("Next requested without an active genre");
            return Step::Render(self.screen());
        };

        let term = pick_refinement(&genre, &mut self.rng);
        let query = PageQuery::refined(&genre, term);
        info!("Loading next {} page with {:?}", genre, query.to_string());
        self.notice = None;

        let (fetch, stage) = first_fetch(&query);
        self.issue(
            Plan::Next {
                genre,
                query,
                stage,
            },
            fetch,
        )
    }

    /// Go back one genre page, replaying its stored query.
    pub fn begin_previous(&mut self) -> Step {
        let Some(genre) = self.current.genre.clone() else {
            debug!("Previous requested without an active genre");
            return Step::Render(self.screen());
        };

        if self.genre_pages.len() <= 1 {
            info!("At first {} page, reloading it", genre);
            return self.start_genre(genre);
        }

        self.genre_pages.pop();
        let Some(target) = self.genre_pages.last().cloned() else {
            return self.start_genre(genre);
        };

        info!("Loading previous {} page with {:?}", genre, target.search_query.to_string());
        self.notice = None;
        let (fetch, stage) = first_fetch(&target.search_query);
        self.issue(Plan::Previous { target, stage }, fetch)
    }

    /// Drill into the card at `index`. The current view is saved first.
    pub fn open_artist(&mut self, index: usize) -> Option<ArtistPageRequest> {
        let card = self.current.artists.get(index)?.clone();
        info!("Opening artist {} ({})", card.name, card.id);

        self.save_current();
        self.cancel_pending();
        self.notice = None;
        self.detail = Some(card.id.clone());
        Some(ArtistPageRequest::for_artist(card.id, card.name))
    }

    /// Restore the most recent saved view, or load popular artists when
    /// there is none.
    pub fn back(&mut self) -> Step {
        self.cancel_pending();
        self.detail = None;
        self.notice = None;

        let Some(view) = self.history.pop() else {
            info!("History empty, falling back to popular artists");
            return self.begin_popular();
        };

        info!("Restoring {:?}", view.kind());
        self.genre_pages.clear();
        if let Some(genre) = &view.genre {
            self.genre_pages.push(GenrePageState {
                genre: genre.clone(),
                offset: view.offset,
                search_query: PageQuery::genre_tracks(genre),
                artists: view.artists.clone(),
            });
        }
        self.current = view;
        Step::Render(self.screen())
    }

    /// Apply the response for `ticket`.
    pub fn complete(&mut self, ticket: Ticket, outcome: FetchOutcome) -> Step {
        let is_current = self.pending.as_ref().is_some_and(|p| p.ticket == ticket);
        if !is_current {
            debug!("Dropping stale response for generation {}", ticket.generation());
            return Step::Stale;
        }
        let Some(pending) = self.pending.take() else {
            return Step::Stale;
        };

        match pending.plan {
            Plan::Popular { ids } => self.finish_popular(&ids, outcome),
            Plan::Search { term } => self.finish_search(term, outcome),
            Plan::GenreSelect { genre, stage } => match self.advance(stage, outcome) {
                PageProgress::Continue(fetch) => self.resume(
                    ticket,
                    Plan::GenreSelect {
                        genre,
                        stage: Stage::Artists,
                    },
                    fetch,
                ),
                PageProgress::Loaded(records) => {
                    let artists = summarize(&records, Some(&genre));
                    self.genre_pages = vec![GenrePageState {
                        genre: genre.clone(),
                        offset: 0,
                        search_query: PageQuery::genre_tracks(&genre),
                        artists: artists.clone(),
                    }];
                    self.current = ViewState::genre(genre, 0, artists);
                    Step::Render(self.screen())
                }
                PageProgress::Empty => {
                    self.notice = Some(Notice::empty(genre_failed_message(&genre)));
                    self.current = ViewState::genre(genre, 0, Vec::new());
                    Step::Render(self.screen())
                }
                PageProgress::Failed(err) => {
                    self.notice = Some(Notice::for_failure(&err, genre_failed_message(&genre)));
                    self.current = ViewState::genre(genre, 0, Vec::new());
                    Step::Render(self.screen())
                }
            },
            Plan::Next {
                genre,
                query,
                stage,
            } => self.finish_next(ticket, genre, query, stage, outcome),
            Plan::Previous { target, stage } => match self.advance(stage, outcome) {
                PageProgress::Continue(fetch) => self.resume(
                    ticket,
                    Plan::Previous {
                        target,
                        stage: Stage::Artists,
                    },
                    fetch,
                ),
                PageProgress::Loaded(records) => {
                    let artists = summarize(&records, Some(&target.genre));
                    if let Some(top) = self.genre_pages.last_mut() {
                        top.artists.clone_from(&artists);
                    }
                    self.current = ViewState::genre(target.genre, target.offset, artists);
                    Step::Render(self.screen())
                }
                PageProgress::Empty => {
                    self.notice = Some(Notice::empty(previous_empty_message(&target.genre)));
                    self.current = ViewState::genre(target.genre, target.offset, target.artists);
                    Step::Render(self.screen())
                }
                PageProgress::Failed(err) => {
                    self.notice = Some(Notice::for_failure(&err, MSG_PREVIOUS_FAILED));
                    self.current = ViewState::genre(target.genre, target.offset, target.artists);
                    Step::Render(self.screen())
                }
            },
        }
    }

    fn finish_popular(&mut self, ids: &[String], outcome: FetchOutcome) -> Step {
        match outcome {
            Ok(FetchResult::Artists(records)) if !records.is_empty() => {
                self.current = ViewState::popular(summarize(&records, Some(POPULAR_LABEL)));
            }
            Ok(_) => {
                warn!("Popular lookup returned no artists");
                self.notice = Some(Notice::error(MSG_POPULAR_FAILED));
                self.current = ViewState::popular(placeholder_cards(ids));
            }
            Err(err) => {
                self.notice = Some(Notice::for_failure(&err, MSG_POPULAR_FAILED));
                self.current = ViewState::popular(placeholder_cards(ids));
            }
        }
        Step::Render(self.screen())
    }

    fn finish_search(&mut self, term: String, outcome: FetchOutcome) -> Step {
        match outcome {
            Ok(FetchResult::Artists(records)) if !records.is_empty() => {
                self.current = ViewState::search(term, summarize(&records, None));
            }
            Ok(_) => {
                self.notice = Some(Notice::empty(MSG_SEARCH_EMPTY));
                self.current = ViewState::search(term, Vec::new());
            }
            Err(err) => {
                self.notice = Some(Notice::for_failure(&err, MSG_SEARCH_FAILED));
                self.current = ViewState::search(term, Vec::new());
            }
        }
        Step::Render(self.screen())
    }

    fn finish_next(
        &mut self,
        ticket: Ticket,
        genre: String,
        query: PageQuery,
        stage: Stage,
        outcome: FetchOutcome,
    ) -> Step {
        match self.advance(stage, outcome) {
            PageProgress::Continue(fetch) => self.resume(
                ticket,
                Plan::Next {
                    genre,
                    query,
                    stage: Stage::Artists,
                },
                fetch,
            ),
            PageProgress::Loaded(records) => {
                let artists = summarize(&records, Some(&genre));
                let offset = self.next_offset();
                self.genre_pages.push(GenrePageState {
                    genre: genre.clone(),
                    offset,
                    search_query: query,
                    artists: artists.clone(),
                });
                self.current = ViewState::genre(genre, offset, artists);
                Step::Render(self.screen())
            }
            PageProgress::Empty => {
                if matches!(query, PageQuery::ArtistSearch { .. }) {
                    debug!("Refined search for {} was empty, using genre tracks", genre);
                    let query = PageQuery::genre_tracks(&genre);
                    let (fetch, stage) = first_fetch(&query);
                    return self.resume(
                        ticket,
                        Plan::Next {
                            genre,
                            query,
                            stage,
                        },
                        fetch,
                    );
                }
                self.notice = Some(Notice::error(MSG_NEXT_FAILED));
                Step::Render(self.screen())
            }
            PageProgress::Failed(err) => {
                self.notice = Some(Notice::for_failure(&err, MSG_NEXT_FAILED));
                Step::Render(self.screen())
            }
        }
    }

    fn advance(&self, stage: Stage, outcome: FetchOutcome) -> PageProgress {
        match (stage, outcome) {
            (_, Err(err)) => PageProgress::Failed(err),
            (Stage::Tracks, Ok(FetchResult::Tracks(tracks))) => {
                let ids = extract_artist_ids(&tracks, self.config.page_size);
                if ids.is_empty() {
                    PageProgress::Empty
                } else {
                    PageProgress::Continue(Fetch::SeveralArtists { ids })
                }
            }
            (Stage::Artists, Ok(FetchResult::Artists(records))) => {
                if records.is_empty() {
                    PageProgress::Empty
                } else {
                    PageProgress::Loaded(records)
                }
            }
            (stage, Ok(_)) => {
                warn!("Unexpected response shape while waiting for {:?}", stage);
                PageProgress::Empty
            }
        }
    }

    fn next_offset(&self) -> u32 {
        let step = u32::try_from(self.config.page_size).unwrap_or(u32::MAX);
        self.genre_pages
            .last()
            .map_or(self.current.offset, |p| p.offset)
            .saturating_add(step)
    }

    /// Record the current view before navigating away from it.
    ///
    /// Only views with at least one artist are recorded: an empty or failed
    /// view has nothing for `back` to restore. A view equal to the most
    /// recent entry is not recorded twice, which happens when a transition
    /// is abandoned before it replaced the view.
    fn save_current(&mut self) {
        if self.current.artists.is_empty() || self.history.last() == Some(&self.current) {
            return;
        }
        self.history.push(self.current.clone());
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Abandoning transition {}", pending.ticket.generation());
        }
    }

    fn issue(&mut self, plan: Plan, fetch: Fetch) -> Step {
        self.generation += 1;
        let ticket = Ticket(self.generation);
        self.resume(ticket, plan, fetch)
    }

    fn resume(&mut self, ticket: Ticket, plan: Plan, fetch: Fetch) -> Step {
        self.pending = Some(Pending { ticket, plan });
        Step::Fetch(Request { ticket, fetch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SimplifiedArtist, TrackRecord};
    use crate::navigation::NoticeKind;

    fn artist(id: &str) -> ArtistRecord {
        ArtistRecord {
            id: id.to_string(),
            name: format!("Artist {id}"),
            images: Vec::new(),
            genres: Vec::new(),
            followers: None,
            popularity: None,
            external_urls: crate::catalog::ExternalUrls::default(),
        }
    }

    fn artists(ids: &[&str]) -> FetchOutcome {
        Ok(FetchResult::Artists(ids.iter().map(|id| artist(id)).collect()))
    }

    fn tracks(ids: &[&str]) -> FetchOutcome {
        Ok(FetchResult::Tracks(
            ids.iter()
                .map(|id| TrackRecord {
                    id: None,
                    name: "t".into(),
                    artists: vec![SimplifiedArtist {
                        id: Some((*id).to_string()),
                        name: "n".into(),
                    }],
                    album: None,
                    preview_url: None,
                    external_urls: crate::catalog::ExternalUrls::default(),
                })
                .collect(),
        ))
    }

    fn request(step: Step) -> Request {
        match step {
            Step::Fetch(request) => request,
            other => panic!("expected a fetch, got {other:?}"),
        }
    }

    fn screen(step: Step) -> Screen {
        match step {
            Step::Render(screen) => screen,
            other => panic!("expected a render, got {other:?}"),
        }
    }

    fn session() -> NavigationSession {
        NavigationSession::with_seed(SessionConfig::default(), 3)
    }

    fn ids(screen: &Screen) -> Vec<&str> {
        screen.artists.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_popular_draws_page_size_ids() {
        let mut nav = session();
        let req = request(nav.begin_popular());
        let Fetch::SeveralArtists { ids: drawn } = &req.fetch else {
            panic!("popular must use the several-artists lookup");
        };
        assert_eq!(drawn.len(), 6);

        let refs: Vec<&str> = drawn.iter().map(String::as_str).collect();
        let shown = screen(nav.complete(req.ticket, artists(&refs)));
        assert_eq!(shown.state, NavState::Popular);
        assert_eq!(ids(&shown), refs);
        assert!(shown.artists.iter().all(|a| a.genre == "Popular"));
        assert_eq!(shown.heading.as_deref(), Some("Popular Artists"));
    }

    #[test]
    fn test_popular_failure_shows_placeholders() {
        let mut nav = session();
        let req = request(nav.begin_popular());
        let shown = screen(nav.complete(
            req.ticket,
            Err(CatalogError::Http {
                operation: "Get several artists",
                status: 503,
            }),
        ));
        assert_eq!(shown.artists.len(), 6);
        assert_eq!(shown.notice.unwrap().message, MSG_POPULAR_FAILED);
    }

    #[test]
    fn test_empty_search_input() {
        let mut nav = session();
        let shown = screen(nav.begin_search("   "));
        assert_eq!(shown.notice.unwrap().message, MSG_EMPTY_SEARCH_INPUT);
        assert!(!nav.is_loading());
    }

    #[test]
    fn test_genre_two_step_load() {
        let mut nav = session();
        let req = request(nav.begin_genre("Jazz"));
        assert_eq!(
            req.fetch,
            Fetch::SearchByGenre {
                genre: "Jazz".into()
            }
        );

        let req2 = request(nav.complete(req.ticket, tracks(&["b", "a", "b", "c"])));
        assert_eq!(req2.ticket, req.ticket);
        assert_eq!(
            req2.fetch,
            Fetch::SeveralArtists {
                ids: vec!["b".into(), "a".into(), "c".into()]
            }
        );

        let shown = screen(nav.complete(req2.ticket, artists(&["b", "a", "c"])));
        assert_eq!(shown.state, NavState::GenreBrowsing("Jazz".into()));
        assert_eq!(shown.heading.as_deref(), Some("Jazz Artists"));
        assert!(shown.can_go_next);
        assert!(!shown.can_go_previous);
        assert_eq!(nav.genre_pages().len(), 1);
        assert!(shown.artists.iter().all(|a| a.genre == "Jazz"));
    }

    #[test]
    fn test_genre_without_ids_is_empty_state() {
        let mut nav = session();
        let req = request(nav.begin_genre("Jazz"));
        let shown = screen(nav.complete(req.ticket, tracks(&[])));
        assert_eq!(shown.state, NavState::GenreBrowsing("Jazz".into()));
        assert!(shown.artists.is_empty());
        let notice = shown.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Empty);
        assert_eq!(notice.message, "No Jazz music found. Please try another genre.");
    }

    #[test]
    fn test_next_falls_back_to_genre_tracks() {
        let mut nav = session();
        let req = request(nav.begin_genre("Rock"));
        let req = request(nav.complete(req.ticket, tracks(&["a"])));
        screen(nav.complete(req.ticket, artists(&["a"])));

        let req = request(nav.begin_next());
        let Fetch::SearchArtists { query } = &req.fetch else {
            panic!("next starts with a refined artist search");
        };
        assert!(query.starts_with("genre:Rock "));

        let req = request(nav.complete(req.ticket, artists(&[])));
        assert_eq!(
            req.fetch,
            Fetch::SearchByGenre {
                genre: "Rock".into()
            }
        );
        let req = request(nav.complete(req.ticket, tracks(&["z"])));
        let shown = screen(nav.complete(req.ticket, artists(&["z"])));

        assert_eq!(ids(&shown), vec!["z"]);
        assert!(shown.can_go_previous);
        assert_eq!(
            nav.genre_pages()[1].search_query,
            PageQuery::genre_tracks("Rock")
        );
        assert_eq!(nav.current_view().offset, 6);
    }

    #[test]
    fn test_next_failure_keeps_page() {
        let mut nav = session();
        let req = request(nav.begin_genre("Rock"));
        let req = request(nav.complete(req.ticket, tracks(&["a"])));
        screen(nav.complete(req.ticket, artists(&["a"])));

        let req = request(nav.begin_next());
        let shown = screen(nav.complete(
            req.ticket,
            Err(CatalogError::Http {
                operation: "Search",
                status: 500,
            }),
        ));
        assert_eq!(ids(&shown), vec!["a"]);
        assert_eq!(shown.notice.unwrap().message, MSG_NEXT_FAILED);
        assert_eq!(nav.genre_pages().len(), 1);
    }

    #[test]
    fn test_previous_failure_restores_snapshot() {
        let mut nav = session();
        let req = request(nav.begin_genre("Rock"));
        let req = request(nav.complete(req.ticket, tracks(&["a"])));
        screen(nav.complete(req.ticket, artists(&["a"])));
        let req = request(nav.begin_next());
        screen(nav.complete(req.ticket, artists(&["b"])));

        let req = request(nav.begin_previous());
        let shown = screen(nav.complete(
            req.ticket,
            Err(CatalogError::Http {
                operation: "Search",
                status: 502,
            }),
        ));
        assert_eq!(ids(&shown), vec!["a"]);
        assert_eq!(shown.notice.unwrap().message, MSG_PREVIOUS_FAILED);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut nav = session();
        let old = request(nav.begin_search("first"));
        let new = request(nav.begin_search("second"));

        assert_eq!(nav.complete(old.ticket, artists(&["x"])), Step::Stale);
        let shown = screen(nav.complete(new.ticket, artists(&["y"])));
        assert_eq!(shown.state, NavState::SearchResults("second".into()));
        assert_eq!(ids(&shown), vec!["y"]);

        // Completing twice is stale as well
        assert_eq!(nav.complete(new.ticket, artists(&["z"])), Step::Stale);
    }

    #[test]
    fn test_open_artist_cancels_pending_and_saves_view() {
        let mut nav = session();
        let req = request(nav.begin_search("Daft Punk"));
        screen(nav.complete(req.ticket, artists(&["dp", "other"])));

        let late = request(nav.begin_genre("Pop"));
        let page = nav.open_artist(0);
        // The pending genre load never replaced the search view, so it is
        // saved once
        assert_eq!(nav.history().len(), 1);
        assert_eq!(nav.history().last().unwrap().search_term, "Daft Punk");
        assert_eq!(nav.complete(late.ticket, tracks(&["p"])), Step::Stale);

        let page = page.unwrap();
        assert_eq!(page.artist_id.as_deref(), Some("dp"));
        assert_eq!(nav.state(), NavState::ArtistDetail("dp".into()));
        assert!(nav.open_artist(99).is_none());
    }

    #[test]
    fn test_empty_view_is_not_saved() {
        let mut nav = session();
        let req = request(nav.begin_search("nobody"));
        let shown = screen(nav.complete(req.ticket, artists(&[])));
        assert!(shown.artists.is_empty());

        request(nav.begin_genre("Jazz"));
        assert!(nav.history().is_empty());
    }

    #[test]
    fn test_back_restores_genre_stack() {
        let mut nav = session();
        let req = request(nav.begin_genre("Soul"));
        let req = request(nav.complete(req.ticket, tracks(&["s1"])));
        screen(nav.complete(req.ticket, artists(&["s1"])));
        nav.open_artist(0).unwrap();

        let shown = screen(nav.back());
        assert_eq!(shown.state, NavState::GenreBrowsing("Soul".into()));
        assert_eq!(ids(&shown), vec!["s1"]);
        assert_eq!(nav.genre_pages().len(), 1);

        // Nothing left, back loads popular
        let req = request(nav.back());
        assert!(matches!(req.fetch, Fetch::SeveralArtists { .. }));
    }
}
