//! In-band image directive detection.
//!
//! The model asks for an illustration by writing
//! `[GENERATE_IMAGE: <description>]` somewhere in its answer. Only the first
//! marker of a turn is honored.

use regex::Regex;
use std::sync::OnceLock;

static IMAGE_DIRECTIVE_REGEX: OnceLock<Regex> = OnceLock::new();

fn image_directive_regex() -> &'static Regex {
    IMAGE_DIRECTIVE_REGEX.get_or_init(|| {
        // Lazy body so two markers on one line stay separate.
        Regex::new(r"\[GENERATE_IMAGE:\s*(.*?)\]").expect("Failed to compile image directive regex")
    })
}

/// Returns the description of the first image directive in `text`.
///
/// Markers with a blank description are skipped.
pub fn extract_image_directive(text: &str) -> Option<String> {
    image_directive_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|description| !description.is_empty())
        .map(str::to_string)
}
