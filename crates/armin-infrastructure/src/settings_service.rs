//! Settings resolution: stored settings plus environment credentials.

use std::sync::Arc;

use armin_core::config::AppSettings;
use armin_core::error::Result;
use armin_core::repository::SettingsRepository;

/// Environment variables consulted for the API key, in priority order.
pub const ENV_API_KEY_VARS: [&str; 2] = ["ARMIN_API_KEY", "API_KEY"];

/// Loads and saves [`AppSettings`], applying an environment API key on top
/// of whatever is stored.
///
/// An environment key always wins over the stored one and is never written
/// back to the repository.
#[derive(Clone)]
pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
    env_api_key: Option<String>,
}

impl SettingsService {
    /// Creates a service reading the credential from the process environment.
    pub fn new(repository: Arc<dyn SettingsRepository>) -> Self {
        Self::with_env_api_key(repository, api_key_from_env())
    }

    /// Creates a service with an explicit environment credential.
    pub fn with_env_api_key(
        repository: Arc<dyn SettingsRepository>,
        env_api_key: Option<String>,
    ) -> Self {
        let env_api_key = env_api_key.filter(|key| !key.trim().is_empty());
        Self {
            repository,
            env_api_key,
        }
    }

    pub fn has_env_credential(&self) -> bool {
        self.env_api_key.is_some()
    }

    /// Returns the effective settings: stored values (or defaults) with the
    /// environment credential applied.
    pub async fn load(&self) -> Result<AppSettings> {
        let stored = self.repository.load().await?;
        if stored.is_none() {
            tracing::debug!("[Settings] No stored settings, using defaults");
        }
        Ok(self.apply_env(stored.unwrap_or_default().normalized()))
    }

    /// Persists `settings` and returns the effective settings afterwards.
    ///
    /// When the given key is the environment key, the previously stored key
    /// is persisted instead.
    pub async fn save(&self, settings: &AppSettings) -> Result<AppSettings> {
        let mut to_store = settings.clone().normalized();
        if let Some(env_key) = &self.env_api_key {
            if to_store.api_key == *env_key {
                let stored_key = self
                    .repository
                    .load()
                    .await?
                    .map(|stored| stored.api_key)
                    .unwrap_or_default();
                to_store.api_key = stored_key;
            }
        }

        self.repository.save(&to_store).await?;
        Ok(self.apply_env(to_store))
    }

    fn apply_env(&self, settings: AppSettings) -> AppSettings {
        match &self.env_api_key {
            Some(key) => {
                tracing::debug!("[Settings] Using API key from environment");
                settings.with_api_key(key.clone())
            }
            None => settings,
        }
    }
}

fn api_key_from_env() -> Option<String> {
    ENV_API_KEY_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
