//! Grounding citations attached to model messages.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Title used when the service returns a source without one.
pub const DEFAULT_CITATION_TITLE: &str = "Web source";

/// A web source the model grounded its answer on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

impl Citation {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Ordered collection of citations, unique by URI.
///
/// The first citation seen for a URI is kept; later ones with the same URI
/// are ignored even when their title differs.
#[derive(Debug, Clone, Default)]
pub struct CitationSet {
    seen: HashSet<String>,
    items: Vec<Citation>,
}

impl CitationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a citation. Returns false when its URI was already present or empty.
    pub fn insert(&mut self, citation: Citation) -> bool {
        if citation.uri.is_empty() || self.seen.contains(&citation.uri) {
            return false;
        }
        self.seen.insert(citation.uri.clone());
        self.items.push(citation);
        true
    }

    pub fn extend<I: IntoIterator<Item = Citation>>(&mut self, citations: I) {
        for citation in citations {
            self.insert(citation);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Citation] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Citation> {
        self.items
    }
}
