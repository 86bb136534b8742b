// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// The name of the icsync application.
pub const APP_NAME: &str = "icsync";

/// Periodic sync intervals are clamped to this floor regardless of the
/// configured value.
pub const MIN_SYNC_INTERVAL_MINUTES: u32 = 15;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Configuration for the icsync application.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Directory the calendar store materializes calendars into.
    pub store_dir: PathBuf,

    /// Directory for the local event index database.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Interval between scheduled sync passes, in minutes.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u32,

    /// Timeout for a single feed fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// UI theme preference. Opaque pass-through setting.
    #[serde(default)]
    pub theme: Theme,

    /// Debug flag. Opaque pass-through setting.
    #[serde(default)]
    pub debug: bool,
}

impl Config {
    /// Normalize the configuration: expand paths, default the state
    /// directory, and clamp the sync interval to its floor.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        self.store_dir = expand_path(&self.store_dir)?;

        match &self.state_dir {
            Some(dir) => self.state_dir = Some(expand_path(dir)?),
            None => match get_state_dir() {
                Ok(dir) => self.state_dir = Some(dir.join(APP_NAME)),
                Err(e) => tracing::warn!("failed to get state directory: {e}"),
            },
        }

        if self.sync_interval_minutes < MIN_SYNC_INTERVAL_MINUTES {
            tracing::warn!(
                configured = self.sync_interval_minutes,
                floor = MIN_SYNC_INTERVAL_MINUTES,
                "sync interval below floor, clamping"
            );
            self.sync_interval_minutes = MIN_SYNC_INTERVAL_MINUTES;
        }

        Ok(())
    }

    /// The fetch timeout as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// UI theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

fn default_sync_interval() -> u32 {
    MIN_SYNC_INTERVAL_MINUTES
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

/// Handle tilde (~) and environment variables in the path
fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path
        .to_str()
        .ok_or_else(|| ConfigError("invalid path encoding".into()))?;

    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or_else(|| ConfigError("user-specific home directory not found".into()))
}

fn get_state_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_dir();
    state_dir.ok_or_else(|| ConfigError("user-specific state directory not found".into()))
}
