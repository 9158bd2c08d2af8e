//! Error types for Armin.

use std::fmt;

use thiserror::Error;

/// Recognized categories of a failed call to the generative-AI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection, TLS or mid-stream I/O failure.
    Network,
    /// The service rejected the call because the usage quota is exhausted.
    QuotaExceeded,
    /// The configured API key was rejected.
    InvalidCredential,
    /// Any other non-success answer from the service.
    Service,
    /// The service answered with a body we could not decode.
    Decode,
}

impl TransportErrorKind {
    /// Classifies a failure from its HTTP status (if any) and error text.
    ///
    /// Quota detection wins over credential detection because the service
    /// reports exhausted keys with both words present.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();
        if status == Some(429) || lower.contains("quota") || lower.contains("resource_exhausted")
        {
            return Self::QuotaExceeded;
        }
        if matches!(status, Some(401) | Some(403))
            || lower.contains("api key")
            || lower.contains("api_key_invalid")
        {
            return Self::InvalidCredential;
        }
        match status {
            None => Self::Network,
            Some(_) => Self::Service,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::QuotaExceeded => "quota exceeded",
            Self::InvalidCredential => "invalid credential",
            Self::Service => "service",
            Self::Decode => "decode",
        };
        f.write_str(label)
    }
}

/// A shared error type for the whole Armin workspace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArminError {
    /// No API key is configured; nothing was sent.
    #[error("No API key configured")]
    MissingCredential,

    /// A single file exceeded the attachment size ceiling.
    #[error("Attachment '{name}' is too large ({size} bytes, limit {limit} bytes)")]
    AttachmentTooLarge { name: String, size: u64, limit: u64 },

    /// A send was requested while another one is still in flight.
    #[error("A message is already being sent")]
    SendAlreadyInProgress,

    /// Caller-supplied input failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No message with the given id exists in the conversation.
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// The generative-AI service call failed.
    #[error("Transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        status: Option<u16>,
        message: String,
    },

    /// The secondary image call failed or returned no image.
    #[error("Image generation failed: {0}")]
    ImageGenerationFailed(String),

    /// A one-shot analysis or explanation call failed.
    #[error("{operation} failed: {message}")]
    SecondaryCallFailed { operation: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArminError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error, classifying it from status and message.
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Transport {
            kind: TransportErrorKind::classify(status, &message),
            status,
            message,
        }
    }

    /// Creates a Transport error for an undecodable response body.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Transport {
            kind: TransportErrorKind::Decode,
            status: None,
            message: message.into(),
        }
    }

    /// Creates a SecondaryCallFailed error for the named operation.
    pub fn secondary(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SecondaryCallFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::QuotaExceeded,
                ..
            }
        )
    }

    pub fn is_invalid_credential(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::InvalidCredential,
                ..
            }
        )
    }

    /// Text shown to the user in the message bubble and notification banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => "Enter your API key in the settings first.".to_string(),
            Self::AttachmentTooLarge { name, .. } => format!("{name} is too large."),
            Self::SendAlreadyInProgress => {
                "Please wait for the current answer to finish.".to_string()
            }
            Self::Transport {
                kind: TransportErrorKind::QuotaExceeded,
                ..
            } => "Usage quota exhausted (Quota Exceeded). Please wait a moment and try again."
                .to_string(),
            Self::Transport {
                kind: TransportErrorKind::InvalidCredential,
                ..
            } => "The API key is invalid.".to_string(),
            Self::Transport { message, .. } => {
                if message.trim().is_empty() {
                    "Unknown error".to_string()
                } else {
                    message.clone()
                }
            }
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ArminError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ArminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ArminError>`.
pub type Result<T> = std::result::Result<T, ArminError>;
