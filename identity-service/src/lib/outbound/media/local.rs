use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::errors::MediaError;
use crate::account::ports::MediaStore;

/// Filesystem-backed media store.
///
/// Copies uploaded temp files into a served media directory and hands back
/// the public URL. Stored files get a fresh UUID name; only the extension
/// of the original upload survives.
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, local_path: &Path) -> Result<String, MediaError> {
        let extension = local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let target = self.root.join(&file_name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| MediaError::StoreFailed(e.to_string()))?;
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|e| MediaError::StoreFailed(e.to_string()))?;

        tracing::debug!(
            source = %local_path.display(),
            target = %target.display(),
            "Stored media asset"
        );

        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            file_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_copies_file_and_returns_url() {
        let root = std::env::temp_dir().join(format!("media-{}", Uuid::new_v4()));
        let store = LocalMediaStore::new(&root, "http://localhost:8080/media/");

        let source = std::env::temp_dir().join(format!("{}.png", Uuid::new_v4()));
        tokio::fs::write(&source, b"png bytes").await.unwrap();

        let url = store.store(&source).await.expect("Store failed");

        assert!(url.starts_with("http://localhost:8080/media/"));
        assert!(url.ends_with(".png"));

        // Source is untouched; stored copy exists under the root
        assert!(source.exists());
        let stored_name = url.rsplit('/').next().unwrap();
        assert!(root.join(stored_name).exists());

        tokio::fs::remove_file(&source).await.unwrap();
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_missing_source_fails() {
        let root = std::env::temp_dir().join(format!("media-{}", Uuid::new_v4()));
        let store = LocalMediaStore::new(&root, "http://localhost:8080/media");

        let missing = std::env::temp_dir().join(format!("{}.png", Uuid::new_v4()));
        let result = store.store(&missing).await;
        assert!(matches!(result, Err(MediaError::StoreFailed(_))));
    }
}
