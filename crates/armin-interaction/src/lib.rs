//! Gemini transport for Armin.
//!
//! - `wire`: REST payload types
//! - `request_builder`: conversation state to request mapping
//! - `response`: stream/one-shot decoding and HTTP error mapping
//! - `backend`: the `GenerativeBackend` seam
//! - `gemini_api_client`: reqwest implementation of the seam

pub mod backend;
pub mod gemini_api_client;
pub mod request_builder;
pub mod response;
pub mod wire;

pub use backend::{BackendRequest, ChunkStream, GenerativeBackend};
pub use gemini_api_client::GeminiApiClient;
pub use request_builder::{build_chat_request, frame_text_attachment, message_parts};
pub use response::{ModelReply, StreamChunk};
