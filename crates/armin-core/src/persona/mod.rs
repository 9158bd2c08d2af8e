//! Persona domain module.
//!
//! # Module Structure
//!
//! - `model`: Persona descriptor and theming (`Persona`, `PersonaTheme`)
//! - `preset`: The fixed catalog and lookup helpers

mod model;
mod preset;

// Re-export public API
pub use model::{Persona, PersonaTheme};
pub use preset::{
    ARMIN_ULTIMATE_ID, CORE_SYSTEM_PROMPT, DOCTOR_LIFE_ID, ENGINEER_PRO_ID, TEACHER_MATH_ID,
    default_persona, find_persona, get_default_presets,
};
