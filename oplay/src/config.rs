//! Player configuration
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`OPLAY_DEVICE`, `OPLAY_FRAMES`, `OPLAY_POLL_MS`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Arguments and environment variables are merged by the CLI parser, so this
//! module only sees "explicit override or nothing".

use crate::audio::types::DEFAULT_REQUEST_FRAMES;
use crate::error::{Error, Result};
use crate::playback::lifecycle::DEFAULT_POLL_INTERVAL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Longest accepted polling interval
pub const MAX_POLL_MS: u64 = 1000;

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub device: Option<String>,
    pub frames: Option<u32>,
    pub poll_ms: Option<u64>,
}

impl FileConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Explicit overrides from the command line or environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device: Option<String>,
    pub frames: Option<u32>,
    pub poll_ms: Option<u64>,
}

/// Fully resolved player settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Output device name (None = default device)
    pub device: Option<String>,
    /// Frames per device callback to request
    pub request_frames: u32,
    /// Lifecycle loop polling interval
    pub poll_interval: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            device: None,
            request_frames: DEFAULT_REQUEST_FRAMES,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PlayerConfig {
    /// Resolve settings from overrides and the first config file found.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let file = match find_config_file() {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                FileConfig::load(&path)?
            }
            None => FileConfig::default(),
        };
        Self::from_sources(overrides, file)
    }

    /// Merge overrides over file values over defaults and validate.
    pub fn from_sources(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let defaults = PlayerConfig::default();

        let device = overrides.device.or(file.device).filter(|d| !d.is_empty());
        let request_frames = overrides
            .frames
            .or(file.frames)
            .unwrap_or(defaults.request_frames);
        let poll_ms = overrides
            .poll_ms
            .or(file.poll_ms)
            .unwrap_or(defaults.poll_interval.as_millis() as u64);

        if request_frames == 0 {
            return Err(Error::Config("frames must be greater than zero".to_string()));
        }
        if !(1..=MAX_POLL_MS).contains(&poll_ms) {
            return Err(Error::Config(format!(
                "poll interval must be between 1 and {} ms, got {}",
                MAX_POLL_MS, poll_ms
            )));
        }

        Ok(Self {
            device,
            request_frames,
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

/// Config file location: `OPLAY_CONFIG`, then the user config directory,
/// then `/etc/oplay/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("OPLAY_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("oplay").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/oplay/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}
