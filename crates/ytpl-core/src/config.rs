//! Application configuration management.
//!
//! Settings live in a JSON file under the platform configuration directory
//! (`<config_dir>/ytpl/config.json`). A missing file means defaults; fields
//! missing from an existing file also fall back to their defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default YouTube Data API v3 endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Default environment variable holding the OAuth bearer token.
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "YOUTUBE_ACCESS_TOKEN";

/// Privacy status given to playlists created by category division.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistPrivacy {
    /// Only the owner can see the playlist.
    #[default]
    Private,
    /// Anyone with the link can see the playlist.
    Unlisted,
    /// Everyone can see the playlist.
    Public,
}

impl PlaylistPrivacy {
    /// Value of the API's `status.privacyStatus` field.
    pub const fn as_api_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Unlisted => "unlisted",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for PlaylistPrivacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the YouTube Data API.
    pub api_base_url: String,
    /// Region used to look up category labels.
    pub region_code: String,
    /// Directory preview and result reports are written to.
    pub report_directory: PathBuf,
    /// Environment variable holding the OAuth bearer token.
    pub access_token_env: String,
    /// Privacy of playlists created by category division.
    pub new_playlist_privacy: PlaylistPrivacy,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            region_code: "US".to_string(),
            report_directory: PathBuf::from("."),
            access_token_env: DEFAULT_ACCESS_TOKEN_ENV.to_string(),
            new_playlist_privacy: PlaylistPrivacy::default(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            Error::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })?;

        info!("Loaded config from {}", path.display());
        debug!("Report directory: {}", config.report_directory.display());
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Read the OAuth bearer token from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the variable is unset or blank.
    pub fn access_token(&self) -> Result<String> {
        self.access_token_with(|name| std::env::var(name).ok())
    }

    /// Like [`Self::access_token`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the variable is unset or blank.
    pub fn access_token_with<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(&self.access_token_env)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "No access token: set the {} environment variable",
                    self.access_token_env
                ))
            })
    }
}

/// Default path of the config file, if the platform has a config directory.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ytpl").join("config.json"))
}
