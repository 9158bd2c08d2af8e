//! Infrastructure layer for Armin.
//!
//! Provides the file-backed settings repository, credential resolution and
//! filesystem access for attachments.

pub mod file_loader;
pub mod paths;
pub mod settings_repository;
pub mod settings_service;

pub use file_loader::FileLoader;
pub use paths::ArminPaths;
pub use settings_repository::JsonSettingsRepository;
pub use settings_service::{ENV_API_KEY_VARS, SettingsService};
