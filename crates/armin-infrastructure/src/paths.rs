//! Unified path management for Armin configuration files.
//!
//! Every file the client persists lives under the platform config directory
//! resolved by the `dirs` crate.

use std::path::PathBuf;

use armin_core::error::{ArminError, Result};

const APP_DIR: &str = "armin";
const SETTINGS_FILE: &str = "settings.json";

/// Unified path management for Armin.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/armin/             # Config directory (XDG on Linux)
/// └── settings.json            # {"armin_settings": {...}}
/// ```
pub struct ArminPaths;

impl ArminPaths {
    /// Returns the Armin configuration directory.
    ///
    /// Fails with a configuration error when the platform has no config
    /// directory (no home directory).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| ArminError::config("Cannot find config directory"))
    }

    /// Returns the path of the settings file.
    pub fn settings_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(SETTINGS_FILE))
    }

    /// Returns the settings file path inside an explicit base directory.
    pub fn settings_file_in(base: impl Into<PathBuf>) -> PathBuf {
        base.into().join(SETTINGS_FILE)
    }
}
