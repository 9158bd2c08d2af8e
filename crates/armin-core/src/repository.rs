//! Repository traits implemented by the infrastructure layer.

use async_trait::async_trait;

use crate::config::AppSettings;
use crate::error::Result;

/// Persistence for [`AppSettings`].
///
/// Conversation history is never persisted, so this is the only repository
/// the core defines.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Loads stored settings, or `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<AppSettings>>;

    /// Replaces the stored settings.
    async fn save(&self, settings: &AppSettings) -> Result<()>;
}
