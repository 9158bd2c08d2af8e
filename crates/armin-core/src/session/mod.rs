//! Conversation state for the active persona.
//!
//! # Module Structure
//!
//! - `message`: `Message`, `MessageRole`, `GeneratedImage`, `FinalFields`
//! - `citation`: grounding sources and URI de-duplication
//! - `conversation`: the ordered message log and its mutation rules
//!
//! History lives only in memory for the current session.

mod citation;
mod conversation;
mod message;

pub use citation::{Citation, CitationSet, DEFAULT_CITATION_TITLE};
pub use conversation::Conversation;
pub use message::{FinalFields, GeneratedImage, Message, MessageRole};
