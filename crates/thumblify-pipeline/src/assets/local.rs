use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use super::{AssetStore, StoredAsset, validate_key, validate_segment};
use crate::error::StorageError;

/// Stores assets as flat files under `{dir}/{folder}/{filename}`; the server
/// serves `dir` at `public_base_url`.
pub struct LocalStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub async fn new(dir: PathBuf, public_base_url: impl Into<String>) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir).await?;
        info!("Local asset directory: {}", dir.display());
        Ok(Self {
            dir,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl AssetStore for LocalStore {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredAsset, StorageError> {
        validate_segment(folder)?;
        validate_segment(filename)?;

        let folder_path = self.dir.join(folder);
        fs::create_dir_all(&folder_path).await?;
        fs::write(folder_path.join(filename), &data).await?;

        let key = format!("{}/{}", folder, filename);
        Ok(StoredAsset {
            url: self.url_for(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match fs::remove_file(self.dir.join(key)).await {
            Ok(()) => {
                info!("Deleted local asset {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Local asset {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("assets"), "http://localhost:3000/assets/")
            .await
            .unwrap();

        let asset = store
            .upload("thumbnails", "a.png", "image/png", b"png".to_vec())
            .await
            .unwrap();
        assert_eq!(asset.key, "thumbnails/a.png");
        assert_eq!(asset.url, "http://localhost:3000/assets/thumbnails/a.png");
        let on_disk = store.dir().join("thumbnails").join("a.png");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"png");

        store.delete(&asset.key).await.unwrap();
        assert!(!on_disk.exists());
        // Second delete is a no-op
        store.delete(&asset.key).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf(), "http://x").await.unwrap();
        let err = store
            .upload("..", "a.png", "image/png", vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert!(store.delete("thumbnails/../../secret").await.is_err());
    }
}
