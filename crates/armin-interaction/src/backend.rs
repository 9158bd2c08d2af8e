//! Transport seam between the orchestration layer and the generative service.

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;

use armin_core::error::Result;

use crate::response::{ModelReply, StreamChunk};
use crate::wire::GenerateContentRequest;

/// Ordered increments of a streaming reply. Dropping it aborts the call.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// A request addressed to a specific model with a specific credential.
#[derive(Clone)]
pub struct BackendRequest {
    pub model: String,
    pub api_key: String,
    pub body: GenerateContentRequest,
}

impl BackendRequest {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        body: GenerateContentRequest,
    ) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            body,
        }
    }
}

impl fmt::Debug for BackendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRequest")
            .field("model", &self.model)
            .field("api_key", &if self.api_key.trim().is_empty() { "<empty>" } else { "<set>" })
            .field("body", &self.body)
            .finish()
    }
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Starts a streaming call.
    ///
    /// Errors returned here mean the call never produced a stream; failures
    /// after that arrive as `Err` items.
    async fn stream_chat(&self, request: BackendRequest) -> Result<ChunkStream>;

    /// Performs a single request/response round trip.
    async fn generate(&self, request: BackendRequest) -> Result<ModelReply>;
}
