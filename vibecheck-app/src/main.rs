mod browse;
mod cli;
mod favorites_watcher;
mod player;
mod render;

use crate::browse::BrowseSession;
use crate::cli::{Args, Command, ConfigAction, FavoritesAction};
use crate::player::ProcessBackend;
use chrono::Utc;
use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vibecheck_core::{
    animation_driver, build_config_template, config::file_logging_enabled, load_artist_page,
    ArtistPageRequest, AudioPreviewController, CatalogClient, CoreError, FavoriteMetadata,
    FavoritesStore, KeyValueStorage, Navigator, NoticeBoard, NoticeKind, Screen, SessionConfig,
    SqliteStorage, TomlParseError, VibecheckConfig,
};
use vibecheck_spotify_api::{SpotifyCatalog, SpotifyProviderConfig, SPOTIFY_CONFIG_TEMPLATE};

const APP_NAME: &str = "VibeCheck";

const PROVIDER_TEMPLATES: &[&str] = &[SPOTIFY_CONFIG_TEMPLATE];

fn main() {
    let args = Args::parse();

    // Check config for logging.enabled before full config load
    let config_path = VibecheckConfig::config_path();
    init_tracing(file_logging_enabled(&config_path));

    if let Command::Config { action } = args.command {
        std::process::exit(run_config_action(action, &config_path));
    }

    // Load config or create template on first run
    let config = match VibecheckConfig::load_or_create(Some(PROVIDER_TEMPLATES)) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            show_new_config_message(&path);
            std::process::exit(0);
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            show_config_parse_error(&parse_error, &config_path);
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            eprintln!("{APP_NAME}: {e}");
            std::process::exit(1);
        }
    };

    let catalog = if args.command.needs_catalog() {
        let missing = missing_catalog_fields(&config);
        if !missing.is_empty() {
            show_missing_fields(&missing, &config_path);
            std::process::exit(1);
        }
        match create_catalog(&config) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                error!("{e}");
                eprintln!("{APP_NAME}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    // Create tokio runtime for the command
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let code = runtime.block_on(run(args.command, &config, catalog, cancel_token));

    // Stdin reads sit on a blocking thread that never returns on its own
    runtime.shutdown_timeout(Duration::from_millis(500));
    std::process::exit(code);
}

fn create_catalog(config: &VibecheckConfig) -> Result<Arc<dyn CatalogClient>, CoreError> {
    let spotify_config = SpotifyProviderConfig::from_providers(&config.providers)?.ok_or_else(
        || CoreError::ConfigMissingField {
            field: "providers.spotify".into(),
        },
    )?;
    spotify_config.validate()?;
    info!("Using Spotify catalog (market {})", spotify_config.market);
    Ok(Arc::new(SpotifyCatalog::new(&spotify_config)?))
}

/// Execute one command and return the process exit code.
async fn run(
    command: Command,
    config: &VibecheckConfig,
    catalog: Option<Arc<dyn CatalogClient>>,
    cancel_token: CancellationToken,
) -> i32 {
    let db_path = vibecheck_core::storage_db_path();
    let storage = match SqliteStorage::open(&db_path).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to open local storage: {}", e);
            eprintln!("{APP_NAME}: {e}");
            return 1;
        }
    };
    let favorites = FavoritesStore::new(Arc::new(storage.clone()));

    let result = match (command, catalog) {
        (Command::Favorites { action }, _) => run_favorites(action, &favorites).await,
        (Command::Browse, Some(catalog)) => {
            run_browse(config, catalog, favorites, &storage, cancel_token).await
        }
        (command, Some(catalog)) => {
            tokio::select! {
                () = cancel_token.cancelled() => Ok(130),
                result = run_one_shot(command, config, catalog, &favorites) => result,
            }
        }
        (command, None) => {
            error!("No catalog available for {:?}", command);
            Ok(1)
        }
    };

    if let Err(e) = storage.checkpoint().await {
        warn!("Failed to checkpoint local storage: {}", e);
    }

    result.unwrap_or_else(|e| {
        error!("{e}");
        eprintln!("{APP_NAME}: {e}");
        1
    })
}

fn create_player(config: &VibecheckConfig) -> AudioPreviewController {
    AudioPreviewController::new(
        Box::new(ProcessBackend::from_config(&config.preview)),
        NoticeBoard::new(Duration::from_secs(config.preview.notice_secs)),
    )
}

/// Popular, genre, search and artist: render once and exit.
async fn run_one_shot(
    command: Command,
    config: &VibecheckConfig,
    catalog: Arc<dyn CatalogClient>,
    favorites: &FavoritesStore,
) -> Result<i32, CoreError> {
    let animations = animation_driver(&config.ui);
    let mut navigator = Navigator::new(Arc::clone(&catalog), SessionConfig::from(&config.browse));

    let screen = match command {
        Command::Popular => navigator.popular().await,
        Command::Genre { genre } => navigator.genre(&genre).await,
        Command::Search { term } => navigator.search(&term).await,
        Command::Artist { id, name, query } => {
            let request = query.as_deref().map_or(
                ArtistPageRequest {
                    artist_id: id,
                    artist_name: name,
                    from_home: false,
                },
                ArtistPageRequest::from_query,
            );
            let page = load_artist_page(catalog.as_ref(), Some(favorites), &request).await;
            let player = create_player(config);
            render::print_artist_page(&page, &player, animations.as_ref()).await;
            return Ok(i32::from(page.notice.is_some()));
        }
        Command::Browse | Command::Favorites { .. } | Command::Config { .. } => return Ok(1),
    };

    render::print_screen(&screen, animations.as_ref()).await;
    Ok(screen_exit_code(&screen))
}

async fn run_browse(
    config: &VibecheckConfig,
    catalog: Arc<dyn CatalogClient>,
    favorites: FavoritesStore,
    storage: &SqliteStorage,
    cancel_token: CancellationToken,
) -> Result<i32, CoreError> {
    let animations = animation_driver(&config.ui);
    info!("Using {} animations", animations.name());

    let watcher = match favorites_watcher::watch_storage(
        &vibecheck_core::storage_db_path(),
        Arc::new(storage.clone()) as Arc<dyn KeyValueStorage>,
        cancel_token.clone(),
    ) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Favorites will not follow other processes: {}", e);
            None
        }
    };

    let navigator = Navigator::new(catalog, SessionConfig::from(&config.browse));
    let session = BrowseSession::new(navigator, favorites, create_player(config), animations).await?;
    let result = browse::run(session, cancel_token.clone()).await;

    // Stop the watcher whether the session ended by `quit` or Ctrl+C
    cancel_token.cancel();
    if let Some(watcher) = watcher {
        watcher.join().await;
    }
    result.map(|()| 0)
}

fn screen_exit_code(screen: &Screen) -> i32 {
    match screen.notice.as_ref().map(|n| n.kind) {
        None | Some(NoticeKind::Empty) => 0,
        Some(NoticeKind::Error) => 1,
        Some(NoticeKind::Credentials) => 2,
    }
}

async fn run_favorites(action: FavoritesAction, favorites: &FavoritesStore) -> Result<i32, CoreError> {
    match action {
        FavoritesAction::List => {
            render::print_favorites(&favorites.list_favorites().await?, Utc::now());
        }
        FavoritesAction::Add {
            artist,
            title,
            preview_url,
        } => {
            let metadata = FavoriteMetadata::with_preview(preview_url.as_deref());
            favorites.set_favorite(&artist, &title, &metadata).await?;
            println!("Saved \"{title}\" by {artist}.");
        }
        FavoritesAction::Remove { artist, title } => {
            favorites.clear_favorite(&artist, &title).await?;
            println!("Removed \"{title}\" by {artist}.");
        }
        FavoritesAction::Toggle {
            artist,
            title,
            preview_url,
        } => {
            let metadata = FavoriteMetadata::with_preview(preview_url.as_deref());
            if favorites.toggle_favorite(&artist, &title, &metadata).await? {
                println!("Saved \"{title}\" by {artist}.");
            } else {
                println!("Removed \"{title}\" by {artist}.");
            }
        }
    }
    Ok(0)
}

fn run_config_action(action: ConfigAction, config_path: &Path) -> i32 {
    match action {
        ConfigAction::Path => println!("{}", config_path.display()),
        ConfigAction::Open => {
            if !config_path.exists() {
                if let Err(e) = reset_config_to_template(config_path) {
                    error!("Failed to create config file: {e}");
                    return 1;
                }
            }
            // Open config file in default editor
            if let Err(e) = open::that(config_path) {
                error!("Failed to open config file: {e}");
                return 1;
            }
        }
        ConfigAction::Reset => {
            if let Err(e) = reset_config_to_template(config_path) {
                error!("Failed to reset config file: {e}");
                eprintln!("Failed to reset configuration:\n{e}");
                return 1;
            }
            println!(
                "Configuration has been reset to the default template at {}.\n\
                Please edit it with your Spotify credentials.",
                config_path.display()
            );
        }
    }
    0
}

/// Collect every missing catalog field for a single user-facing message
fn missing_catalog_fields(config: &VibecheckConfig) -> Vec<String> {
    match SpotifyProviderConfig::from_providers(&config.providers) {
        Ok(Some(spotify_config)) => spotify_config
            .missing_fields()
            .into_iter()
            .map(String::from)
            .collect(),
        Ok(None) => vec!["providers.spotify".into()],
        Err(_) => vec!["providers.spotify (invalid format)".into()],
    }
}

fn show_missing_fields(missing_fields: &[String], config_path: &Path) {
    eprintln!(
        "{APP_NAME} - Configuration Required\n\n\
        The following required configuration fields are missing or empty:\n\n{}\n\n\
        Please edit {} to add these values (`vibecheck config open`).\n\n\
        Get Spotify credentials from:\nhttps://developer.spotify.com/dashboard",
        missing_fields
            .iter()
            .map(|f| format!("  - {f}"))
            .collect::<Vec<_>>()
            .join("\n"),
        config_path.display()
    );
}

fn show_new_config_message(config_path: &Path) {
    println!(
        "{APP_NAME} - Configuration Created\n\n\
        A configuration file has been created at {}.\n\n\
        Please edit it with your Spotify credentials:\n\
        \x20 - providers.spotify.client_id\n\
        \x20 - providers.spotify.client_secret\n\n\
        Get these from:\nhttps://developer.spotify.com/dashboard",
        config_path.display()
    );
}

fn show_config_parse_error(parse_error: &TomlParseError, config_path: &Path) {
    eprintln!(
        "{APP_NAME} - Configuration Error\n\n\
        Your configuration file {} has a syntax error and cannot be loaded.\n\n\
        Error: {parse_error}\n\n\
        You can either:\n\
        \x20 - fix the syntax error (`vibecheck config open`)\n\
        \x20 - reset to a fresh configuration template (`vibecheck config reset`)",
        config_path.display()
    );
}

fn reset_config_to_template(config_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, build_config_template(Some(PROVIDER_TEMPLATES)))
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    // Console output shares stderr with the prompt, so it stays quiet by default
    let default_filter = if file_logging_enabled { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = vibecheck_core::log_file_path();

        // Create config directory if needed
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
