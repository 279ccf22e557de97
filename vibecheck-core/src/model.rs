use crate::catalog::ArtistRecord;
use serde::{Deserialize, Serialize};

/// Image shown on a card when the catalog has none
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/200";

/// Genre label used when nothing better is known
pub const FALLBACK_GENRE: &str = "Music";

/// One artist card in a rendered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    pub image_url: String,
    /// Display genre (the active filter, the view label, or the artist's own)
    pub genre: String,
}

impl ArtistSummary {
    /// Build a card from a catalog record.
    ///
    /// `label` wins over the artist's own genres; the card falls back to
    /// [`FALLBACK_GENRE`] and [`PLACEHOLDER_IMAGE_URL`].
    #[must_use]
    pub fn from_record(record: &ArtistRecord, label: Option<&str>) -> Self {
        let genre = label
            .or_else(|| record.genres.first().map(String::as_str))
            .unwrap_or(FALLBACK_GENRE);

        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            image_url: record
                .primary_image()
                .unwrap_or(PLACEHOLDER_IMAGE_URL)
                .to_string(),
            genre: genre.to_string(),
        }
    }

    /// Build a card with no catalog backing (demo/placeholder content).
    pub fn placeholder(id: impl Into<String>, name: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            genre: genre.into(),
        }
    }
}

/// Map records to cards, keeping the input order.
#[must_use]
pub fn summarize(records: &[ArtistRecord], label: Option<&str>) -> Vec<ArtistSummary> {
    records
        .iter()
        .map(|r| ArtistSummary::from_record(r, label))
        .collect()
}
