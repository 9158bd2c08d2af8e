//! Attachment domain module.
//!
//! - `model`: attachment records (`Attachment`, `AttachmentPayload`)
//! - `ingest`: file classification and the size ceiling

mod ingest;
mod model;

pub use ingest::{FileClass, FileInput, classify, ingest_batch, ingest_file};
pub use model::{Attachment, AttachmentKind, AttachmentPayload, MAX_ATTACHMENT_BYTES};
