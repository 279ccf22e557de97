use crate::model::ArtistSummary;
use rand::seq::SliceRandom;
use rand::Rng;

/// Label shown on popular cards
pub const POPULAR_LABEL: &str = "Popular";

/// Well-known artists the popular view draws from, as `(id, name)`.
pub const POPULAR_ARTISTS: &[(&str, &str)] = &[
    ("2h93pZq0e7k5yf4dywlkpM", "Frank Ocean"),
    ("06HL4z0CvFAxyc27GXpf02", "Taylor Swift"),
    ("3TVXtAsR1Inumwj472S9r4", "Drake"),
    ("0du5cEVh5yTK9QJze8zA0C", "Bruno Mars"),
    ("1uNFoZAHBGtllmzznpCI3s", "Justin Bieber"),
    ("1Xyo4u8uXC1ZmMpatF05PJ", "The Weeknd"),
    ("6eUKZXaKkcviH0Ku9w2n3V", "Ed Sheeran"),
    ("66CXWjxzNUsdJxJ2JdwvnR", "Ariana Grande"),
    ("4q3ewBCX7sLwd24euuV69X", "Bad Bunny"),
    ("5K4W6rqBFWDnAN6FQUkS6x", "Kanye West"),
    ("7dGJo4pcD2V6oG8kP0tJRR", "Eminem"),
    ("3Nrfpe0tUJi4K4DXYWgMUX", "BTS"),
    ("1HY2Jd0NmPuamShAr6KMms", "Lady Gaga"),
    ("0C8ZW7ezQVs4URX5aX7Kqx", "Selena Gomez"),
    ("6qqNVTkY8uBg9cP3Jd7DAH", "Billie Eilish"),
    ("4dpARuHxo51G3z768sgnrY", "Adele"),
    ("1McMsnEElThX1knmY4oliG", "Olivia Rodrigo"),
    ("6jJ0s89eD6GaHleKKya26X", "Katy Perry"),
    ("53XhwfbYqKCa1cC15pYq2q", "Imagine Dragons"),
    ("7n2wHs1TKAczGzO7Dd2rGr", "Shawn Mendes"),
];

/// Draw `count` distinct popular artist ids in random order.
pub fn draw_popular_ids<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    let mut ids: Vec<&str> = POPULAR_ARTISTS.iter().map(|(id, _)| *id).collect();
    ids.shuffle(rng);
    ids.into_iter().take(count).map(ToString::to_string).collect()
}

/// Name-only cards for `ids`, shown when the popular lookup fails.
#[must_use]
pub fn placeholder_cards(ids: &[String]) -> Vec<ArtistSummary> {
    ids.iter()
        .filter_map(|id| {
            POPULAR_ARTISTS
                .iter()
                .find(|(known, _)| known == id)
                .map(|(known, name)| ArtistSummary::placeholder(*known, *name, POPULAR_LABEL))
        })
        .collect()
}
