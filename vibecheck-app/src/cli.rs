//! Command-line surface of the `vibecheck` binary.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vibecheck")]
#[command(about = "VibeCheck: discover artists by genre, preview tracks, keep favorites")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a random selection of popular artists
    Popular,

    /// Show artists for a genre
    Genre {
        /// Genre name, e.g. "Jazz" or "R&B"
        genre: String,
    },

    /// Search artists by name
    Search {
        /// Free text search term
        term: String,
    },

    /// Show an artist page with top tracks
    ///
    /// Accepts an id, a name, or a raw query string such as
    /// `artistId=...&artistName=...&fromHome=true`.
    Artist {
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// URL query string with `artistId`, `artistName` and `fromHome`
        #[arg(long, conflicts_with_all = ["id", "name"])]
        query: Option<String>,
    },

    /// Manage saved favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Interactive browsing session
    Browse,

    /// Inspect or reset the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum FavoritesAction {
    /// List saved tracks, newest first
    List,

    /// Save a track
    Add {
        artist: String,
        title: String,

        /// Preview clip URL to keep with the favorite
        #[arg(long)]
        preview_url: Option<String>,
    },

    /// Remove a saved track
    Remove { artist: String, title: String },

    /// Save the track if absent, remove it otherwise
    Toggle {
        artist: String,
        title: String,

        #[arg(long)]
        preview_url: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Open the config file in the default editor
    Open,
    /// Overwrite the config file with a fresh template
    Reset,
}

impl Command {
    /// Whether the command talks to the catalog service.
    #[must_use]
    pub const fn needs_catalog(&self) -> bool {
        matches!(
            self,
            Self::Popular
                | Self::Genre { .. }
                | Self::Search { .. }
                | Self::Artist { .. }
                | Self::Browse
        )
    }
}
