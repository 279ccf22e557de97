//! Home page navigation: popular artists, genre browsing with exact
//! previous/next paging, artist search, and a bounded back history.
//!
//! [`NavigationSession`] holds all state and never performs I/O. Each
//! transition returns a [`Step`]: either a screen to render or a
//! [`Request`] whose result is fed back through
//! [`NavigationSession::complete`]. [`Navigator`] runs that loop against a
//! [`crate::catalog::CatalogClient`].

mod driver;
mod genre;
mod history;
mod popular;
mod session;

pub use driver::Navigator;
pub use genre::{extract_artist_ids, pick_refinement, refinement_terms, GenrePageState, PageQuery};
pub use history::NavigationHistory;
pub use popular::{draw_popular_ids, placeholder_cards, POPULAR_ARTISTS, POPULAR_LABEL};
pub use session::{NavigationSession, SessionConfig};

use crate::catalog::{ArtistRecord, TrackRecord};
use crate::error::CatalogError;
use crate::model::ArtistSummary;

/// Page a view was rendered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    #[default]
    Home,
}

/// One rendered result set, as saved in the back history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Active genre filter
    pub genre: Option<String>,
    pub offset: u32,
    /// Cards in display order
    pub artists: Vec<ArtistSummary>,
    /// Search input, empty outside search results
    pub search_term: String,
    pub origin: Origin,
}

impl ViewState {
    #[must_use]
    pub fn popular(artists: Vec<ArtistSummary>) -> Self {
        Self {
            artists,
            ..Self::default()
        }
    }

    pub fn genre(genre: impl Into<String>, offset: u32, artists: Vec<ArtistSummary>) -> Self {
        Self {
            genre: Some(genre.into()),
            offset,
            artists,
            ..Self::default()
        }
    }

    pub fn search(term: impl Into<String>, artists: Vec<ArtistSummary>) -> Self {
        Self {
            artists,
            search_term: term.into(),
            ..Self::default()
        }
    }

    /// Which kind of view this is.
    #[must_use]
    pub fn kind(&self) -> NavState {
        match &self.genre {
            Some(genre) => NavState::GenreBrowsing(genre.clone()),
            None if !self.search_term.is_empty() => {
                NavState::SearchResults(self.search_term.clone())
            }
            None => NavState::Popular,
        }
    }
}

/// Where the user currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Popular,
    GenreBrowsing(String),
    SearchResults(String),
    ArtistDetail(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Nothing matched
    Empty,
    /// Transient failure, retry is possible
    Error,
    /// Credentials missing or rejected; retrying will not help
    Credentials,
}

/// Message shown above the results until the next transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Empty,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    fn for_failure(err: &CatalogError, message: impl Into<String>) -> Self {
        if err.is_credential_error() {
            tracing::error!("Catalog rejected credentials: {}", err);
            Self {
                kind: NoticeKind::Credentials,
                message: err.to_string(),
            }
        } else {
            tracing::warn!("Catalog request failed: {}", err);
            Self::error(message)
        }
    }
}

/// Everything the render layer needs for the home page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub state: NavState,
    pub heading: Option<String>,
    pub artists: Vec<ArtistSummary>,
    pub notice: Option<Notice>,
    pub loading: bool,
    pub can_go_next: bool,
    pub can_go_previous: bool,
}

/// Identifies one in-flight transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// A single catalog call the session needs answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    SearchArtists { query: String },
    SearchByGenre { genre: String },
    SeveralArtists { ids: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub ticket: Ticket,
    pub fetch: Fetch,
}

/// Payload of a finished [`Fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Artists(Vec<ArtistRecord>),
    Tracks(Vec<TrackRecord>),
}

pub type FetchOutcome = Result<FetchResult, CatalogError>;

/// What the caller does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run this request and pass the result to `complete`
    Fetch(Request),
    /// Transition finished
    Render(Screen),
    /// The ticket was superseded; nothing changed
    Stale,
}
