//! Mock model and storage for pipeline and API tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thumblify_types::catalog::AspectRatio;

use crate::assets::{AssetStore, StoredAsset};
use crate::error::{ModelError, StorageError};
use crate::model::{GeneratedImage, ImageModel};

enum Behavior {
    Image(Vec<u8>),
    Status(u16),
    NoImage,
}

/// Image model that answers every call the same way and records prompts.
pub struct MockModel {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockModel {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn returning_png(bytes: Vec<u8>) -> Self {
        Self::with(Behavior::Image(bytes))
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self::with(Behavior::Status(status))
    }

    pub fn returning_no_image() -> Self {
        Self::with(Behavior::NoImage)
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl ImageModel for MockModel {
    async fn generate(
        &self,
        prompt: &str,
        _aspect_ratio: AspectRatio,
    ) -> Result<GeneratedImage, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            Behavior::Image(bytes) => Ok(GeneratedImage {
                bytes: bytes.clone(),
                mime_type: "image/png".into(),
            }),
            Behavior::Status(status) => Err(ModelError::Status {
                status: *status,
                body: "mock failure".into(),
                retry_after: None,
            }),
            Behavior::NoImage => Err(ModelError::NoImage),
        }
    }
}

/// In-memory asset store. URLs look like `memory://{key}`.
#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().map(|o| o.is_empty()).unwrap_or(true)
    }
}

#[async_trait]
impl AssetStore for MockStorage {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredAsset, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("mock upload failure".into()));
        }
        let key = format!("{}/{}", folder, filename);
        self.objects
            .lock()
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?
            .insert(key.clone(), data);
        Ok(StoredAsset {
            url: format!("memory://{}", key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?
            .remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
