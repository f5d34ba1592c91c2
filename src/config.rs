//! Persistent settings, read from `config.toml` in the user's config directory.

use crate::error::Result;
use crate::fetcher::DEFAULT_ATTEMPTS;
use crate::model::Container;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The directory name used under the platform config directory.
pub const APP_NAME: &str = "ytmux";

/// Settings of a run. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where final artifacts and temporaries are written.
    pub output_dir: PathBuf,
    /// The ffmpeg executable.
    pub ffmpeg: PathBuf,
    /// The highest adaptive video height tried by the capped ladder.
    pub max_height: u32,
    /// How many times a single track fetch is attempted.
    pub retry_attempts: u32,
    /// The maximum length, in characters, of a file base name.
    pub max_title_len: usize,
    /// The container of every downloaded track and artifact.
    pub format: Container,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            ffmpeg: PathBuf::from("ffmpeg"),
            max_height: 1080,
            retry_attempts: DEFAULT_ATTEMPTS,
            max_title_len: 80,
            format: Container::Mp4,
        }
    }
}

impl Config {
    /// The path of the config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
    }

    /// Parses a config file's content.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads the config file at `path`. A missing or empty file yields the defaults.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file exists but can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::debug!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Reads the config file from the default location, falling back to the defaults when it's
    /// missing or malformed.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
