pub mod animation;
pub mod artist;
pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod model;
pub mod navigation;
pub mod notice;
pub mod paths;
pub mod preview;
pub mod storage;

pub use animation::{animation_driver, AnimationDriver, NoopAnimations, StaggeredAnimations};
pub use artist::{
    format_followers, load_artist_page, ArtistPage, ArtistPageKind, ArtistPageRequest,
    ArtistProfile, TrackRow,
};
pub use catalog::{
    ArtistRecord, ArtistSearchResponse, CatalogClient, SeveralArtistsResponse, TopTracksResponse,
    TrackRecord, TrackSearchResponse,
};
pub use config::{
    build_config_template, BrowseConfig, LoggingConfig, PreviewConfig, ProvidersConfig, UiConfig,
    VibecheckConfig,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::{CatalogError, CoreError, PreviewError};
pub use favorites::{
    favorite_key, relative_date_label, FavoriteEntry, FavoriteMetadata, FavoritesStore,
    FavoritesView,
};
pub use model::ArtistSummary;
pub use navigation::{
    NavState, NavigationSession, Navigator, Notice, NoticeKind, Screen, SessionConfig, ViewState,
};
pub use notice::NoticeBoard;
pub use paths::{
    config_dir, config_path, log_file_path, storage_db_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    LOG_FILE_NAME, STORAGE_DB_FILE_NAME,
};
pub use preview::{AudioBackend, AudioPreviewController, ControlState, PlayOutcome};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageEvent};
