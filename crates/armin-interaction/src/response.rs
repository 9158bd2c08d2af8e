//! Decoding of Gemini responses and error bodies.

use armin_core::error::{ArminError, Result};
use armin_core::session::{Citation, DEFAULT_CITATION_TITLE, GeneratedImage};

use crate::wire::{ErrorWrapper, GenerateContentResponse};

/// One increment of a streaming reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamChunk {
    /// Text delta, if the increment carried any.
    pub text: Option<String>,
    /// Grounding sources reported with this increment.
    pub citations: Vec<Citation>,
}

impl StreamChunk {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            text: Some(delta.into()),
            citations: Vec::new(),
        }
    }

    pub fn citations(citations: Vec<Citation>) -> Self {
        Self {
            text: None,
            citations,
        }
    }
}

/// Complete answer of a one-shot call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub images: Vec<GeneratedImage>,
    pub citations: Vec<Citation>,
}

/// Concatenated text of the first candidate.
pub fn extract_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Inline images of the first candidate, in part order.
pub fn extract_images(response: &GenerateContentResponse) -> Vec<GeneratedImage> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.inline_data.as_ref())
                .map(|inline| GeneratedImage::new(&inline.mime_type, &inline.data))
                .collect()
        })
        .unwrap_or_default()
}

/// Web sources from every candidate's grounding metadata.
///
/// Chunks without a URI are skipped; a missing title falls back to
/// [`DEFAULT_CITATION_TITLE`]. De-duplication is left to the caller, which
/// sees citations across the whole stream.
pub fn extract_citations(response: &GenerateContentResponse) -> Vec<Citation> {
    response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.grounding_metadata.as_ref())
        .flat_map(|metadata| metadata.grounding_chunks.iter())
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.as_deref().filter(|uri| !uri.is_empty())?;
            let title = web
                .title
                .as_deref()
                .filter(|title| !title.is_empty())
                .unwrap_or(DEFAULT_CITATION_TITLE);
            Some(Citation::new(title, uri))
        })
        .collect()
}

pub fn into_reply(response: GenerateContentResponse) -> ModelReply {
    ModelReply {
        text: extract_text(&response),
        images: extract_images(&response),
        citations: extract_citations(&response),
    }
}

fn error_message(wrapper: ErrorWrapper, raw: &str) -> String {
    let status_text = wrapper.error.status.unwrap_or_default();
    let msg = wrapper.error.message.unwrap_or_else(|| raw.to_string());
    if status_text.is_empty() {
        msg
    } else {
        format!("{status_text}: {msg}")
    }
}

/// Decodes one SSE `data:` payload of `streamGenerateContent`.
///
/// The service may also report a failure in-band as an `{"error": ...}`
/// object, which becomes a transport error.
pub fn parse_stream_event(data: &str) -> Result<StreamChunk> {
    if let Ok(wrapper) = serde_json::from_str::<ErrorWrapper>(data) {
        let code = wrapper.error.code;
        return Err(ArminError::transport(code, error_message(wrapper, data)));
    }

    let response: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|err| ArminError::decode(format!("Failed to parse Gemini stream event: {err}")))?;

    let text = extract_text(&response);
    Ok(StreamChunk {
        text: (!text.is_empty()).then_some(text),
        citations: extract_citations(&response),
    })
}

/// Maps a non-success HTTP answer to a classified transport error.
pub fn map_http_error(status: u16, body: &str) -> ArminError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| error_message(wrapper, body))
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("Gemini API returned HTTP {status}")
            } else {
                body.to_string()
            }
        });
    ArminError::transport(Some(status), message)
}
