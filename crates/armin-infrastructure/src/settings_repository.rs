//! JSON-file implementation of [`SettingsRepository`].
//!
//! The file holds a single object keyed by
//! [`SETTINGS_KEY`](armin_core::config::SETTINGS_KEY):
//!
//! ```text
//! {"armin_settings": {"model": "...", "temperature": 0.7, "enableSearch": true, "apiKey": "..."}}
//! ```
//!
//! Writes go to a temporary sibling file which is synced and renamed over
//! the target, so readers never observe a half-written file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use armin_core::config::AppSettings;
use armin_core::error::{ArminError, Result};
use armin_core::repository::SettingsRepository;

use crate::paths::ArminPaths;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(rename = "armin_settings", default, skip_serializing_if = "Option::is_none")]
    settings: Option<AppSettings>,
}

/// Settings stored as JSON on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonSettingsRepository {
    path: PathBuf,
}

impl JsonSettingsRepository {
    /// Repository backed by `<config_dir>/armin/settings.json`.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(ArminPaths::settings_file()?))
    }

    /// Repository backed by an explicit file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| ArminError::config("Settings path has no file name"))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        Ok(self.path.with_file_name(tmp_name))
    }
}

#[async_trait]
impl SettingsRepository for JsonSettingsRepository {
    async fn load(&self) -> Result<Option<AppSettings>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[Settings] No settings file at {}", self.path.display());
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let document: SettingsDocument = serde_json::from_str(&content)?;
        Ok(document.settings.map(AppSettings::normalized))
    }

    async fn save(&self, settings: &AppSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let document = SettingsDocument {
            settings: Some(settings.clone()),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = fs::File::create(&tmp_path).await?;
        tmp_file.write_all(json.as_bytes()).await?;
        tmp_file.sync_all().await?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).await?;
        tracing::info!("[Settings] Saved settings to {}", self.path.display());
        Ok(())
    }
}
