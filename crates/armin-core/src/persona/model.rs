//! Persona domain model.
//!
//! A persona is an immutable preset bundling a system prompt with the theming
//! the presentation layer uses for it.

use serde::{Deserialize, Serialize};

/// Visual theming attached to a persona.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PersonaTheme {
    /// Accent gradient for headers and bubbles
    pub theme_color: String,
    /// Background color of the chat surface
    pub bg_color: String,
    /// Single emoji shown next to the persona name
    pub icon: String,
}

/// A persona presented to the user.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Stable identifier (e.g. `armin-ultimate`)
    pub id: String,
    /// Display name
    pub name: String,
    /// One-line description shown in the picker
    pub description: String,
    /// System instruction sent with every request
    pub system_prompt: String,
    pub theme: PersonaTheme,
}
