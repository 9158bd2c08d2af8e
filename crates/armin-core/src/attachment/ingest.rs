//! Converts raw files into attachment records.
//!
//! Classification happens once, here. Text-like files (JSON, CSV, plain text
//! or a known source/text extension) are decoded and kept as text so the model
//! can read them inline; images and everything else travel as base64.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::model::{Attachment, AttachmentKind, AttachmentPayload, MAX_ATTACHMENT_BYTES};
use crate::error::{ArminError, Result};

/// Extensions treated as text regardless of the reported MIME type.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "csv", "js", "ts", "py", "rs", "java", "c", "cpp", "h", "go", "rb",
    "sh", "html", "css", "xml", "yaml", "yml", "toml", "sql",
];

/// A file selected by the user, before ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInput {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Result of the text-vs-binary classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Text,
    Image,
    Binary,
}

fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Classifies a file from its MIME type and name.
pub fn classify(name: &str, mime_type: &str) -> FileClass {
    let mime = mime_type.to_ascii_lowercase();
    let text_mime = mime.contains("json") || mime.contains("csv") || mime.starts_with("text/plain");
    let text_ext = extension_of(name)
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);

    if text_mime || text_ext {
        FileClass::Text
    } else if mime.starts_with("image/") {
        FileClass::Image
    } else {
        FileClass::Binary
    }
}

/// Ingests a single file.
///
/// Exactly [`MAX_ATTACHMENT_BYTES`] is accepted; one byte more is rejected
/// with [`ArminError::AttachmentTooLarge`].
pub fn ingest_file(file: FileInput) -> Result<Attachment> {
    let size = file.size();
    if size > MAX_ATTACHMENT_BYTES {
        return Err(ArminError::AttachmentTooLarge {
            name: file.name,
            size,
            limit: MAX_ATTACHMENT_BYTES,
        });
    }

    let class = classify(&file.name, &file.mime_type);
    let mime_type = if file.mime_type.trim().is_empty() {
        match class {
            FileClass::Text => "text/plain".to_string(),
            _ => "application/octet-stream".to_string(),
        }
    } else {
        file.mime_type
    };

    let (kind, payload) = match class {
        FileClass::Text => (
            AttachmentKind::File,
            AttachmentPayload::Text(String::from_utf8_lossy(&file.bytes).into_owned()),
        ),
        FileClass::Image => (
            AttachmentKind::Image,
            AttachmentPayload::Binary(STANDARD.encode(&file.bytes)),
        ),
        FileClass::Binary => (
            AttachmentKind::File,
            AttachmentPayload::Binary(STANDARD.encode(&file.bytes)),
        ),
    };

    tracing::debug!(
        "[Ingest] Accepted '{}' ({} bytes, {:?})",
        file.name,
        size,
        class
    );

    Ok(Attachment {
        kind,
        mime_type,
        name: file.name,
        payload,
        size,
    })
}

/// Ingests several files independently, preserving input order.
///
/// One oversized file does not stop its siblings from being processed.
pub fn ingest_batch(files: Vec<FileInput>) -> Vec<Result<Attachment>> {
    files.into_iter().map(ingest_file).collect()
}
