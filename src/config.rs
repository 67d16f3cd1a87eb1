// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Persisted as JSON in the platform config directory. Anything missing or
//! unreadable falls back to defaults with a warning; a broken config file
//! never stops the pipeline from coming up.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_FRAME_TIMEOUT_MS, tap};

/// Tunables persisted across runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total display width mapped coordinates are expressed in
    pub screen_width: u32,
    /// Total display height mapped coordinates are expressed in
    pub screen_height: u32,
    /// Calibration grid rows
    pub calibration_rows: usize,
    /// Calibration grid columns
    pub calibration_cols: usize,
    /// Where the calibration grid is persisted
    pub calibration_path: Option<PathBuf>,
    /// Per-read sensor timeout, milliseconds
    pub frame_timeout_ms: u64,
    /// Presses no longer than this may be taps, milliseconds
    pub tap_max_duration_ms: u32,
    /// Presses that travel farther than this are drags, display pixels
    pub tap_max_travel_px: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            calibration_rows: 3,
            calibration_cols: 3,
            calibration_path: None,
            frame_timeout_ms: DEFAULT_FRAME_TIMEOUT_MS,
            tap_max_duration_ms: tap::MAX_DURATION_MS,
            tap_max_travel_px: tap::MAX_TRAVEL_PX,
        }
    }
}

impl Config {
    /// Path of the persisted config file, when a config directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("depthtouch").join("config.json"))
    }

    /// Default location for the persisted calibration grid
    pub fn default_calibration_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("depthtouch").join("calibration.txt"))
    }

    /// Load the persisted config, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Config unreadable, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the config as pretty JSON
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::default_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&path, text)
    }

    /// The calibration file to use: configured or platform default
    pub fn calibration_file(&self) -> Option<PathBuf> {
        self.calibration_path
            .clone()
            .or_else(Self::default_calibration_path)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}
