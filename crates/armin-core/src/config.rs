//! Application settings and model identifiers.
//!
//! `AppSettings` is owned by the surrounding application and handed to the
//! request builder and orchestrator explicitly at call time. Nothing in the
//! core reads the environment or storage on its own.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default chat model.
pub const TEXT_MODEL: &str = "gemini-3-flash-preview";
/// Heavier model offered for reasoning-intensive work.
pub const REASONING_MODEL: &str = "gemini-3-pro-preview";
/// Model used for every image generation call.
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
/// Model used for single-image description.
pub const VISION_MODEL: &str = "gemini-3-flash-preview";

/// Storage key under which settings are persisted as a flat record.
pub const SETTINGS_KEY: &str = "armin_settings";

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// User-adjustable generation settings.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Model identifier used for chat and file analysis.
    pub model: String,
    /// Sampling temperature, kept within `[0, 2]`.
    pub temperature: f32,
    /// Whether the web search tool is offered to the model.
    pub enable_search: bool,
    /// API credential. Empty means "not configured".
    pub api_key: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            model: TEXT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            enable_search: true,
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("enable_search", &self.enable_search)
            .field("api_key", &if self.has_credential() { "<set>" } else { "<empty>" })
            .finish()
    }
}

impl AppSettings {
    /// Returns true when an API key is present.
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Model to call, falling back to [`TEXT_MODEL`] when none is configured.
    pub fn effective_model(&self) -> &str {
        let model = self.model.trim();
        if model.is_empty() { TEXT_MODEL } else { model }
    }

    /// Returns a copy with the temperature clamped into range and an empty
    /// model replaced by the default.
    pub fn normalized(mut self) -> Self {
        if self.temperature.is_nan() {
            self.temperature = DEFAULT_TEMPERATURE;
        }
        self.temperature = self.temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
        if self.model.trim().is_empty() {
            self.model = TEXT_MODEL.to_string();
        }
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}
