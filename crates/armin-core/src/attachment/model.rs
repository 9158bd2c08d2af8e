//! Attachment records carried by user messages.

use serde::{Deserialize, Serialize};

/// Largest accepted attachment, inclusive.
pub const MAX_ATTACHMENT_BYTES: u64 = 4 * 1024 * 1024;

/// How the presentation layer shows an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    File,
}

/// The attachment content.
///
/// Exactly one representation exists per attachment, fixed at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", content = "data", rename_all = "snake_case")]
pub enum AttachmentPayload {
    /// Base64-encoded bytes sent as an inline binary part.
    Binary(String),
    /// Decoded text inlined into the request inside a file frame.
    Text(String),
}

/// A user-supplied file after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub name: String,
    pub payload: AttachmentPayload,
    /// Size of the original file in bytes.
    pub size: u64,
}

impl Attachment {
    pub fn is_text(&self) -> bool {
        matches!(self.payload, AttachmentPayload::Text(_))
    }

    /// Inlined text, for text-classified attachments.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Text(text) => Some(text),
            AttachmentPayload::Binary(_) => None,
        }
    }

    /// Base64 payload, for binary attachments.
    pub fn base64_data(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Binary(data) => Some(data),
            AttachmentPayload::Text(_) => None,
        }
    }
}
