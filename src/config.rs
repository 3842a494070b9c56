use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::{debug, info};

use crate::calendar::WeekStart;

pub const APP_DIR: &str = "family-hub";
pub const API_BASE_ENV_VAR: &str = "FAMILY_HUB_API_BASE_URL";
const CONFIG_FILE: &str = "config.toml";
const THEME_FILE: &str = "theme.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Per-request timeout; 0 disables it.
    pub request_timeout_secs: u64,
    pub week_start: WeekStart,
    /// Event lines per month-grid cell before "+N more".
    pub max_visible_events: usize,
    pub toast_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 15,
            week_start: WeekStart::Sunday,
            max_visible_events: 3,
            toast_secs: 4,
        }
    }
}

impl Config {
    /// Load from `path`, or the default location when `None`. A missing file
    /// yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => config_dir().map(|d| d.join(CONFIG_FILE)),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => {
                let content = fs::read_to_string(p)
                    .wrap_err_with(|| format!("reading {}", p.display()))?;
                let config: Config = toml::from_str(&content)
                    .wrap_err_with(|| format!("parsing {}", p.display()))?;
                info!(path = %p.display(), "loaded config");
                config
            }
            _ => {
                debug!("no config file, using defaults");
                Config::default()
            }
        };

        if let Ok(url) = std::env::var(API_BASE_ENV_VAR) {
            if !url.trim().is_empty() {
                config.api_base_url = url;
            }
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_secs.max(1))
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

/// `theme.toml` beside the config file in use.
pub fn theme_path(config_path: Option<&Path>) -> Option<PathBuf> {
    match config_path.and_then(Path::parent) {
        Some(dir) => Some(dir.join(THEME_FILE)),
        None => config_dir().map(|d| d.join(THEME_FILE)),
    }
}

pub fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR).join("logs"))
}
