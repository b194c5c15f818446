//! Object storage for generated images.
//!
//! Two backends: Cloudinary for production and a local directory for
//! development. Keys are `{folder}/{name}` and never contain `..`.

mod cloudinary;
mod local;

pub use cloudinary::{CloudinaryConfig, CloudinaryStore, DEFAULT_API_BASE as DEFAULT_CLOUDINARY_API_BASE};
pub use local::LocalStore;

use async_trait::async_trait;

use crate::error::StorageError;

/// Where an uploaded asset ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Backend identifier used for deletion.
    pub key: String,
    /// Publicly reachable URL of the asset.
    pub url: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredAsset, StorageError>;

    /// Deleting an asset that no longer exists is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn backend_name(&self) -> &'static str;
}

/// A single path segment: non-empty, no separators, no dot-only names.
pub(crate) fn validate_segment(segment: &str) -> Result<(), StorageError> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
        || segment.len() > 255;
    if bad {
        return Err(StorageError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    key.split('/').try_for_each(validate_segment)
}
