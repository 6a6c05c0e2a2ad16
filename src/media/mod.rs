use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Media Storage
// ============================================================================
//
// Images attached to records (seller logos) go to a MediaStore which returns
// a public URL. Callers treat a failed upload as a warning, never as a
// failed save.
//
// ============================================================================

/// Raw upload as received from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("upload is empty")]
    Empty,

    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist an upload under `folder` and return its public URL
    async fn store(&self, folder: &str, upload: &MediaUpload) -> Result<String, MediaError>;
}

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Files under a local directory, served from `base_url`
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
            max_bytes,
        }
    }

    fn validate(&self, upload: &MediaUpload) -> Result<&'static str, MediaError> {
        if upload.bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(MediaError::TooLarge { size: upload.bytes.len(), limit: self.max_bytes });
        }

        let extension = upload
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        IMAGE_EXTENSIONS
            .into_iter()
            .find(|known| *known == extension)
            .ok_or_else(|| MediaError::UnsupportedType(upload.file_name.clone()))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, folder: &str, upload: &MediaUpload) -> Result<String, MediaError> {
        let extension = self.validate(upload)?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), &upload.bytes).await?;

        tracing::debug!(folder = folder, name = %name, size = upload.bytes.len(), "Stored media");
        Ok(format!("{}/{}/{}", self.base_url.trim_end_matches('/'), folder, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(max_bytes: usize) -> (LocalMediaStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("fishhappy-media-{}", Uuid::new_v4()));
        (LocalMediaStore::new(&root, "/media/", max_bytes), root)
    }

    fn png(bytes: usize) -> MediaUpload {
        MediaUpload { file_name: "Logo.PNG".to_string(), bytes: vec![7; bytes] }
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_url() {
        let (store, root) = temp_store(1024);

        let url = store.store("logos", &png(64)).await.unwrap();
        assert!(url.starts_with("/media/logos/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        let written = tokio::fs::read(root.join("logos").join(name)).await.unwrap();
        assert_eq!(written.len(), 64);

        tokio::fs::remove_dir_all(root).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_empty_oversized_and_unknown_types() {
        let (store, _) = temp_store(16);

        assert!(matches!(store.store("logos", &png(0)).await, Err(MediaError::Empty)));
        assert!(matches!(store.store("logos", &png(17)).await, Err(MediaError::TooLarge { size: 17, limit: 16 })));

        let pdf = MediaUpload { file_name: "licence.pdf".to_string(), bytes: vec![1; 4] };
        assert!(matches!(store.store("logos", &pdf).await, Err(MediaError::UnsupportedType(_))));
    }
}
