pub mod auth;
pub mod client;
pub mod config;
pub mod token_manager;

pub use auth::SpotifyAuthError;
pub use client::SpotifyCatalog;
pub use config::{CONFIG_TEMPLATE as SPOTIFY_CONFIG_TEMPLATE, SpotifyProviderConfig};
pub use token_manager::SpotifyTokenManager;
