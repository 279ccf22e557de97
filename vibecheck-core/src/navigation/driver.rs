use super::session::{NavigationSession, SessionConfig};
use super::{Fetch, FetchOutcome, FetchResult, Screen, Step};
use crate::artist::ArtistPageRequest;
use crate::catalog::CatalogClient;
use std::sync::Arc;
use tracing::debug;

impl Fetch {
    /// Run this request against `catalog`.
    pub async fn run(&self, catalog: &dyn CatalogClient) -> FetchOutcome {
        match self {
            Self::SearchArtists { query } => catalog
                .search_artists(query)
                .await
                .map(|r| FetchResult::Artists(r.artists.items)),
            Self::SearchByGenre { genre } => catalog
                .search_by_genre(genre)
                .await
                .map(|r| FetchResult::Tracks(r.tracks.items)),
            Self::SeveralArtists { ids } => catalog
                .get_several_artists(ids)
                .await
                .map(|r| FetchResult::Artists(r.artists)),
        }
    }
}

/// Runs a [`NavigationSession`] against a live catalog, one transition at a
/// time.
pub struct Navigator {
    catalog: Arc<dyn CatalogClient>,
    session: NavigationSession,
}

impl Navigator {
    pub fn new(catalog: Arc<dyn CatalogClient>, config: SessionConfig) -> Self {
        Self::with_session(catalog, NavigationSession::new(config))
    }

    pub fn with_session(catalog: Arc<dyn CatalogClient>, session: NavigationSession) -> Self {
        Self { catalog, session }
    }

    #[must_use]
    pub const fn session(&self) -> &NavigationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut NavigationSession {
        &mut self.session
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<dyn CatalogClient> {
        Arc::clone(&self.catalog)
    }

    pub async fn popular(&mut self) -> Screen {
        let step = self.session.begin_popular();
        self.drive(step).await
    }

    pub async fn search(&mut self, term: &str) -> Screen {
        let step = self.session.begin_search(term);
        self.drive(step).await
    }

    pub async fn genre(&mut self, genre: &str) -> Screen {
        let step = self.session.begin_genre(genre);
        self.drive(step).await
    }

    pub async fn next(&mut self) -> Screen {
        let step = self.session.begin_next();
        self.drive(step).await
    }

    pub async fn previous(&mut self) -> Screen {
        let step = self.session.begin_previous();
        self.drive(step).await
    }

    pub async fn back(&mut self) -> Screen {
        let step = self.session.back();
        self.drive(step).await
    }

    pub fn open_artist(&mut self, index: usize) -> Option<ArtistPageRequest> {
        self.session.open_artist(index)
    }

    /// Execute requests until the transition renders.
    async fn drive(&mut self, mut step: Step) -> Screen {
        loop {
            match step {
                Step::Fetch(request) => {
                    debug!("Fetching {:?}", request.fetch);
                    let outcome = request.fetch.run(self.catalog.as_ref()).await;
                    step = self.session.complete(request.ticket, outcome);
                }
                Step::Render(screen) => return screen,
                Step::Stale => return self.session.screen(),
            }
        }
    }
}
