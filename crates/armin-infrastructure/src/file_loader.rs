//! Reads local files into [`FileInput`] values for attachment ingestion.

use std::path::Path;

use tokio::fs;

use armin_core::attachment::{FileInput, MAX_ATTACHMENT_BYTES};
use armin_core::error::{ArminError, Result};

/// Loads files from disk, guessing their MIME type from the extension.
#[derive(Debug, Clone)]
pub struct FileLoader {
    max_bytes: u64,
}

impl Default for FileLoader {
    fn default() -> Self {
        Self {
            max_bytes: MAX_ATTACHMENT_BYTES,
        }
    }
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a single file.
    ///
    /// The size is checked from metadata first, so an oversized file is
    /// rejected without being read.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<FileInput> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ArminError::invalid_input(format!("Not a file path: {}", path.display()))
            })?;

        let metadata = fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ArminError::invalid_input(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > self.max_bytes {
            tracing::warn!(
                "[FileLoader] Rejecting {} ({} bytes)",
                name,
                metadata.len()
            );
            return Err(ArminError::AttachmentTooLarge {
                name,
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }

        let bytes = fs::read(path).await?;
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();

        tracing::debug!("[FileLoader] Loaded {} as '{}'", name, mime_type);
        Ok(FileInput::new(name, mime_type, bytes))
    }

    /// Reads several files, keeping one result per path in order.
    pub async fn load_all<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<Result<FileInput>> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.load(path).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_guesses_mime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let input = FileLoader::new().load(&path).await.unwrap();
        assert_eq!(input.name, "photo.png");
        assert_eq!(input.mime_type, "image/png");
        assert_eq!(input.bytes, vec![0x89, b'P', b'N', b'G']);
        assert!(input.is_image());
    }

    #[tokio::test]
    async fn test_unknown_extension_has_empty_mime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.zzqx");
        std::fs::write(&path, b"data").unwrap();

        let input = FileLoader::new().load(&path).await.unwrap();
        assert_eq!(input.mime_type, "");
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, vec![b'a'; 11]).unwrap();

        let loader = FileLoader { max_bytes: 10 };
        let err = loader.load(&path).await.unwrap_err();
        assert_eq!(
            err,
            ArminError::AttachmentTooLarge {
                name: "big.txt".to_string(),
                size: 11,
                limit: 10,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FileLoader::new()
            .load(dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArminError::Io { .. }));
    }

    #[tokio::test]
    async fn test_load_all_keeps_order() {
        let dir = TempDir::new().unwrap();
        let ok = dir.path().join("a.txt");
        std::fs::write(&ok, b"a").unwrap();
        let missing = dir.path().join("b.txt");

        let results = FileLoader::new().load_all(&[ok, missing]).await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
