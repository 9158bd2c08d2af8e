//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::citation::Citation;
use crate::attachment::Attachment;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Message produced by the model.
    Model,
}

impl MessageRole {
    /// Role tag expected by the generative API.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        }
    }
}

/// An image produced by the image model, kept as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// `data:` URI suitable for embedding.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// A single message in the active conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    /// Grows while `streaming`; fixed once finalized.
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub sources: Vec<Citation>,
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub errored: bool,
    /// Set when the model asked for an image and the image call failed.
    #[serde(default)]
    pub image_error: bool,
}

impl Message {
    fn new(role: MessageRole, content: String, streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
            attachments: Vec::new(),
            sources: Vec::new(),
            images: Vec::new(),
            steps: None,
            streaming,
            errored: false,
            image_error: false,
        }
    }

    /// A finalized user message.
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        let mut message = Self::new(MessageRole::User, content.into(), false);
        message.attachments = attachments;
        message
    }

    /// An empty model message awaiting streamed content.
    pub fn pending_model() -> Self {
        Self::new(MessageRole::Model, String::new(), true)
    }

    /// A finalized model message, mostly useful for seeding history.
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Model, content.into(), false)
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    pub fn is_model(&self) -> bool {
        self.role == MessageRole::Model
    }

    pub fn is_finalized(&self) -> bool {
        !self.streaming
    }
}

/// Terminal fields applied when a streaming message is finalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalFields {
    /// Replaces the streamed content when set.
    pub content: Option<String>,
    pub sources: Vec<Citation>,
    pub images: Vec<GeneratedImage>,
    pub errored: bool,
    pub image_error: bool,
}

impl FinalFields {
    /// Successful completion keeping the streamed content.
    pub fn completed(sources: Vec<Citation>, images: Vec<GeneratedImage>) -> Self {
        Self {
            sources,
            images,
            ..Self::default()
        }
    }

    /// Failure; the content becomes the user-facing error text.
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            content: Some(message.into()),
            errored: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&MessageRole::Model).unwrap(), "\"model\"");
        assert_eq!(MessageRole::User.as_str(), "user");
    }

    #[test]
    fn test_pending_model_is_streaming_and_empty() {
        let message = Message::pending_model();
        assert!(message.is_model());
        assert!(message.streaming);
        assert!(message.content.is_empty());
        assert!(!message.is_finalized());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Message::user("a", vec![]).id, Message::user("a", vec![]).id);
    }

    #[test]
    fn test_data_uri() {
        let image = GeneratedImage::new("image/png", "QUJD");
        assert_eq!(image.data_uri(), "data:image/png;base64,QUJD");
    }
}
