use crate::catalog::TrackRecord;
use crate::model::ArtistSummary;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

/// The exact catalog request that produced a genre page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageQuery {
    /// Track search on `genre:<g>`, artists taken from the tracks
    GenreTracks { genre: String },
    /// Free-text artist search
    ArtistSearch { query: String },
}

impl PageQuery {
    #[must_use]
    pub fn genre_tracks(genre: &str) -> Self {
        Self::GenreTracks {
            genre: genre.to_string(),
        }
    }

    /// Artist search with a refinement term appended to the genre filter.
    #[must_use]
    pub fn refined(genre: &str, term: &str) -> Self {
        Self::ArtistSearch {
            query: format!("genre:{genre} {term}"),
        }
    }
}

impl fmt::Display for PageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenreTracks { genre } => write!(f, "genre:{genre}"),
            Self::ArtistSearch { query } => f.write_str(query),
        }
    }
}

/// One page of genre results, kept so "previous" can replay it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenrePageState {
    pub genre: String,
    pub offset: u32,
    pub search_query: PageQuery,
    pub artists: Vec<ArtistSummary>,
}

const DEFAULT_TERMS: &[&str] = &["new", "popular", "latest", "rising"];

/// Sub-style terms appended to a genre query when paging forward.
#[must_use]
pub fn refinement_terms(genre: &str) -> &'static [&'static str] {
    match genre {
        "R&B" => &["soul", "neo soul", "contemporary", "90s", "modern"],
        "Jazz" => &["bebop", "fusion", "smooth", "contemporary", "traditional"],
        "Hip-hop" => &["rap", "trap", "boom bap", "conscious", "underground"],
        "Pop" => &["indie", "electropop", "synthpop", "dance", "mainstream"],
        "Rock" => &["alternative", "indie", "classic", "hard", "progressive"],
        "Electronic" => &["house", "techno", "dubstep", "ambient", "dance"],
        "Country" => &["americana", "folk", "bluegrass", "outlaw", "modern"],
        "Classical" => &["baroque", "romantic", "contemporary", "orchestral", "piano"],
        "Reggae" => &["dancehall", "roots", "dub", "ska", "modern"],
        "Metal" => &["heavy", "thrash", "death", "black", "progressive"],
        "Indie" => &["alternative", "rock", "pop", "folk", "electronic"],
        "Folk" => &[
            "americana",
            "traditional",
            "contemporary",
            "acoustic",
            "singer-songwriter",
        ],
        "Blues" => &["delta", "chicago", "electric", "acoustic", "modern"],
        "Soul" => &["motown", "philly", "northern", "deep", "modern"],
        "Funk" => &["p-funk", "disco", "afrobeat", "modern", "acid jazz"],
        _ => DEFAULT_TERMS,
    }
}

/// Pick one refinement term for `genre`.
pub fn pick_refinement<R: Rng + ?Sized>(genre: &str, rng: &mut R) -> &'static str {
    refinement_terms(genre).choose(rng).copied().unwrap_or("new")
}

/// Artist ids credited on `tracks`, de-duplicated in first-seen order and
/// truncated to `limit`.
#[must_use]
pub fn extract_artist_ids(tracks: &[TrackRecord], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter_map(|a| a.id.as_deref())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .take(limit)
        .map(ToString::to_string)
        .collect()
}
