//! GeminiApiClient - direct REST implementation of [`GenerativeBackend`].
//!
//! Streaming uses `streamGenerateContent?alt=sse`; every SSE event carries a
//! full `GenerateContentResponse` fragment.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;

use armin_core::error::{ArminError, Result};

use crate::backend::{BackendRequest, ChunkStream, GenerativeBackend};
use crate::response::{self, ModelReply};
use crate::wire::GenerateContentResponse;

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone)]
pub struct GeminiApiClient {
    client: Client,
    base_url: String,
}

impl Default for GeminiApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the client at another endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{model}:{method}", self.base_url)
    }

    async fn post(
        &self,
        url: String,
        query: &[(&str, &str)],
        request: &BackendRequest,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .query(query)
            .json(&request.body)
            .send()
            .await
            // The URL carries the API key; keep it out of error text.
            .map_err(|err| {
                ArminError::transport(None, format!("Gemini API request failed: {}", err.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            tracing::warn!("[GeminiApi] {} answered HTTP {}", request.model, status.as_u16());
            return Err(response::map_http_error(status.as_u16(), &body_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiApiClient {
    async fn stream_chat(&self, request: BackendRequest) -> Result<ChunkStream> {
        tracing::debug!(
            "[GeminiApi] Streaming {} with {} content(s)",
            request.model,
            request.body.contents.len()
        );
        let url = self.endpoint(&request.model, "streamGenerateContent");
        let response = self
            .post(url, &[("alt", "sse"), ("key", request.api_key.as_str())], &request)
            .await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() || data == "[DONE]" {
                            None
                        } else {
                            Some(response::parse_stream_event(data))
                        }
                    }
                    Err(err) => Some(Err(ArminError::transport(
                        None,
                        format!("Gemini stream interrupted: {err}"),
                    ))),
                }
            });

        Ok(stream.boxed())
    }

    async fn generate(&self, request: BackendRequest) -> Result<ModelReply> {
        tracing::debug!("[GeminiApi] generateContent on {}", request.model);
        let url = self.endpoint(&request.model, "generateContent");
        let response = self
            .post(url, &[("key", request.api_key.as_str())], &request)
            .await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ArminError::decode(format!("Failed to parse Gemini response: {}", err.without_url())))?;

        Ok(response::into_reply(parsed))
    }
}
