// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the platform config directory. A missing file means
//! defaults; unknown or missing fields fall back to their defaults too.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory name below the platform config dir
const CONFIG_DIR_NAME: &str = "camera-capture";
/// Config file name
const CONFIG_FILE_NAME: &str = "config.json";

/// GStreamer source used for the camera by default
pub const DEFAULT_VIDEO_SOURCE: &str = "autovideosrc";
/// GStreamer source used for the microphone by default
pub const DEFAULT_AUDIO_SOURCE: &str = "autoaudiosrc";
/// Synthetic camera used by `--test-source`
pub const TEST_VIDEO_SOURCE: &str = "videotestsrc is-live=true pattern=ball";
/// Synthetic microphone used by `--test-source`
pub const TEST_AUDIO_SOURCE: &str = "audiotestsrc is-live=true wave=ticks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the media server (scheme, host, port)
    pub server_url: String,
    /// GStreamer description of the camera source
    pub video_source: String,
    /// GStreamer description of the microphone source
    pub audio_source: String,
    /// Request microphone access and record an audio track
    pub record_audio: bool,
    /// Open navigation targets in the system browser
    pub open_browser: bool,
    /// Upload request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            video_source: DEFAULT_VIDEO_SOURCE.to_string(),
            audio_source: DEFAULT_AUDIO_SOURCE.to_string(),
            record_audio: true,
            open_browser: true,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config from the default location, falling back to defaults
    ///
    /// A malformed file is logged and ignored rather than aborting startup.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("No config directory on this platform, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load the config from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file missing, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Swap the device sources for synthetic test sources
    pub fn use_test_sources(&mut self) {
        self.video_source = TEST_VIDEO_SOURCE.to_string();
        self.audio_source = TEST_AUDIO_SOURCE.to_string();
    }

    /// Upload request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve a server-relative route against `server_url`
    pub fn resolve(&self, route: &str) -> AppResult<String> {
        let base = self.server_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "server_url must start with http:// or https://, got {:?}",
                self.server_url
            )));
        }
        Ok(format!("{}{}", base, route))
    }
}
