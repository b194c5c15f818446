use std::time::Duration;

use thiserror::Error;

/// Failures talking to the generative image model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("no image returned from model")]
    NoImage,

    #[error("prompt blocked by model: {0}")]
    Blocked(String),
}

impl ModelError {
    /// Whether the same request may succeed if simply sent again.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Transport(e) => e.is_timeout() || e.is_connect(),
            ModelError::Status { status, .. } => *status == 503 || *status == 429,
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ModelError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Asset store operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Invalid(String),

    #[error("image generation failed: {0}")]
    Model(#[from] ModelError),

    #[error("image upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("thumbnail record disappeared during generation")]
    RecordMissing,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}
