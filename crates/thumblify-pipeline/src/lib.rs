//! Thumbnail generation pipeline.
//!
//! A request flows through [`prompt::compose_prompt`], an [`model::ImageModel`]
//! (retrying transient upstream failures), an [`assets::AssetStore`] upload,
//! and finally a database update. [`service::ThumbnailService`] owns that
//! sequence and reconciles the stored record when any step fails.

pub mod assets;
pub mod error;
pub mod model;
pub mod prompt;
pub mod records;
pub mod retry;
pub mod service;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{ModelError, PipelineError, StorageError};
pub use service::{ThumbnailService, blocking};
