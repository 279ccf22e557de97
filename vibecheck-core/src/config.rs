use crate::error::{CoreError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of artist cards per page
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Number of whole views kept for back navigation
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Lifetime of transient notices (preview failures and the like)
pub const DEFAULT_NOTICE_SECS: u64 = 3;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VibecheckConfig {
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Catalog provider sections, parsed by the provider crates themselves
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

const fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            history_capacity: default_history_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// External player used for 30-second previews
    #[serde(default = "default_player")]
    pub player: String,
    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
}

fn default_player() -> String {
    "mpv".to_string()
}

fn default_player_args() -> Vec<String> {
    vec!["--no-video".to_string(), "--really-quiet".to_string()]
}

const fn default_notice_secs() -> u64 {
    DEFAULT_NOTICE_SECS
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            player: default_player(),
            player_args: default_player_args(),
            notice_secs: default_notice_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub animations: bool,
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_stagger_ms() -> u64 {
    100
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            animations: true,
            stagger_ms: default_stagger_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/vibecheck/vibecheck.log
    #[serde(default)]
    pub enabled: bool,
}

/// Dynamic `[providers.*]` tables.
///
/// Each catalog provider crate owns the shape of its own section and pulls it
/// out with [`ProvidersConfig::get`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvidersConfig(toml::Table);

impl ProvidersConfig {
    /// Deserialize the section for `name`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] if the section has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.0
            .get(name)
            .map(|value| {
                value.clone().try_into().map_err(|e: toml::de::Error| {
                    CoreError::ConfigInvalid {
                        message: format!("providers.{name}: {e}"),
                    }
                })
            })
            .transpose()
    }

    /// Whether a section for `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl VibecheckConfig {
    /// Get the config file path (~/.config/vibecheck/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create a template on first run.
    ///
    /// `provider_templates` are appended to the base template so each provider
    /// crate documents its own section.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] when the template was just written,
    /// or an error if the file cannot be read or parsed.
    pub fn load_or_create(provider_templates: Option<&[&str]>) -> Result<Self> {
        Self::load_or_create_at(&Self::config_path(), provider_templates)
    }

    /// Same as [`VibecheckConfig::load_or_create`] for an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] when the template was just written,
    /// or an error if the file cannot be read or parsed.
    pub fn load_or_create_at(path: &Path, provider_templates: Option<&[&str]>) -> Result<Self> {
        if !path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(path, build_config_template(provider_templates))?;

            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.browse.page_size == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "browse.page_size must be at least 1".into(),
            });
        }
        if self.browse.history_capacity == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "browse.history_capacity must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Read only the `[logging]` section, ignoring every other error.
///
/// Used before tracing is initialized, when a full load could not report
/// its failures anywhere.
#[must_use]
pub fn file_logging_enabled(path: &Path) -> bool {
    #[derive(Deserialize)]
    struct LoggingOnly {
        #[serde(default)]
        logging: LoggingConfig,
    }

    fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str::<LoggingOnly>(&content).ok())
        .is_some_and(|c| c.logging.enabled)
}

/// Build the first-run config template with the provider sections appended.
#[must_use]
pub fn build_config_template(provider_templates: Option<&[&str]>) -> String {
    let mut template = BASE_CONFIG_TEMPLATE.to_string();
    for section in provider_templates.unwrap_or_default() {
        template.push_str(section);
    }
    template
}

const BASE_CONFIG_TEMPLATE: &str = r#"# VibeCheck Configuration
# ~/.config/vibecheck/config.toml

[browse]
# Artist cards per page when browsing genres
page_size = 6
# Views kept for the back action (oldest dropped first)
history_capacity = 10

[preview]
# Command used to play 30-second previews; the preview URL is appended
player = "mpv"
player_args = ["--no-video", "--really-quiet"]
# How long playback notices stay visible
notice_secs = 3

[ui]
# Staggered card reveal in the terminal
animations = true
stagger_ms = 100

[logging]
# Also write logs to ~/.config/vibecheck/vibecheck.log
enabled = false

"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct DummyProvider {
        client_id: String,
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = VibecheckConfig::from_toml_str("").unwrap();
        assert_eq!(config.browse.page_size, 6);
        assert_eq!(config.browse.history_capacity, 10);
        assert_eq!(config.preview.notice_secs, 3);
        assert_eq!(config.preview.player, "mpv");
        assert!(config.ui.animations);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_base_template_parses() {
        let config = VibecheckConfig::from_toml_str(&build_config_template(None)).unwrap();
        assert_eq!(config.ui.stagger_ms, 100);
        assert_eq!(config.preview.player_args, vec!["--no-video", "--really-quiet"]);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = VibecheckConfig::from_toml_str("[browse]\npage_size = 0\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_provider_section_lookup() {
        let config = VibecheckConfig::from_toml_str(
            "[providers.dummy]\nclient_id = \"abc\"\n",
        )
        .unwrap();
        let dummy: DummyProvider = config.providers.get("dummy").unwrap().unwrap();
        assert_eq!(dummy.client_id, "abc");
        assert!(config.providers.contains("dummy"));
        assert!(config.providers.get::<DummyProvider>("missing").unwrap().is_none());
    }

    #[test]
    fn test_provider_section_wrong_shape() {
        let config =
            VibecheckConfig::from_toml_str("[providers.dummy]\nclient_id = 5\n").unwrap();
        let err = config.providers.get::<DummyProvider>("dummy").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_load_or_create_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let err = VibecheckConfig::load_or_create_at(&path, Some(&["[providers.dummy]\n"]))
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound { .. }));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[providers.dummy]"));

        // Second load parses what was written
        let config = VibecheckConfig::load_or_create_at(&path, None).unwrap();
        assert!(config.providers.contains("dummy"));
    }

    #[test]
    fn test_file_logging_peek() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(!file_logging_enabled(&path));

        fs::write(&path, "[logging]\nenabled = true\n[browse]\npage_size = \"bad\"\n").unwrap();
        // Broken sections elsewhere do not hide the logging flag
        assert!(file_logging_enabled(&path));

        fs::write(&path, "[logging]\nenabled = false\n").unwrap();
        assert!(!file_logging_enabled(&path));
    }
}
