//! Configuration management for WAC.
//!
//! Loads configuration from ${WAC_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use url::Url;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Lays the user's settings over the shipped template.
///
/// The result keeps every comment and key from the template; user values win.
/// The config is flat, so top-level entries are copied as whole items.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;
    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    // Indexing by key replaces the item only, so the template's leading
    // comment (stored on the key) survives.
    for (key, item) in user_doc.iter().filter(|(_, item)| !item.is_none()) {
        doc[key] = item.clone();
    }

    Ok(doc.to_string())
}

pub mod paths {
    //! Path resolution for WAC configuration and data directories.
    //!
    //! WAC_HOME resolution order:
    //! 1. WAC_HOME environment variable (if set)
    //! 2. ~/.config/wac (default)
    //! 3. ./.wac when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the WAC home directory.
    pub fn wac_home() -> PathBuf {
        if let Ok(home) = std::env::var("WAC_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".wac"),
            |h| h.join(".config").join("wac"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        wac_home().join("config.toml")
    }

    /// Returns the directory that holds the persisted session entries.
    pub fn session_dir() -> PathBuf {
        wac_home()
    }

    /// Returns the path to the log directory.
    pub fn logs_dir() -> PathBuf {
        wac_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote API
    pub api_url: String,

    /// Per-request timeout in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// UTC offset (`±HH:MM`) used to interpret reminder date/time input
    pub reminder_utc_offset: String,
}

impl Config {
    const DEFAULT_API_URL: &str = "http://127.0.0.1:3001/";
    /// Default is disabled
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 0;
    const DEFAULT_REMINDER_UTC_OFFSET: &str = "-06:00";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves only the `api_url` field to the config file.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read, merged or written.
    pub fn save_api_url(api_url: &str) -> Result<()> {
        Self::save_api_url_to(&paths::config_path(), api_url)
    }

    /// Saves only the `api_url` field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_api_url_to(path: &Path, api_url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        Url::parse(api_url).with_context(|| format!("Invalid API URL: {api_url}"))?;

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["api_url"] = value(api_url);

        Self::write_config(path, &doc.to_string())
    }

    /// Returns a copy of this config with the API URL replaced, if given.
    #[must_use]
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        self
    }

    /// Returns the API base URL, normalized to end with a slash so that
    /// relative endpoints join underneath it.
    ///
    /// # Errors
    /// Returns an error if `api_url` is not an absolute URL.
    pub fn api_base(&self) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_url))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Returns the offset reminder times are entered in.
    ///
    /// # Errors
    /// Returns an error if `reminder_utc_offset` is not `±HH:MM`.
    pub fn reminder_offset(&self) -> Result<FixedOffset> {
        self.reminder_utc_offset
            .trim()
            .parse::<FixedOffset>()
            .with_context(|| {
                format!(
                    "Invalid reminder_utc_offset '{}' (expected ±HH:MM)",
                    self.reminder_utc_offset
                )
            })
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            reminder_utc_offset: Self::DEFAULT_REMINDER_UTC_OFFSET.to_string(),
        }
    }
}
