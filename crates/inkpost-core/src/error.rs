//! Error types for the media upload pipeline.
//!
//! Every failure path in the pipeline surfaces one of these variants; nothing
//! is silently swallowed. The embedding HTTP layer maps each variant to a
//! response code.

use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidMimeType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("file too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("empty file")]
    EmptyFile,

    #[error("upload rate limit exceeded, window resets at {reset_at}")]
    RateLimitExceeded { reset_at: DateTime<Utc> },

    #[error("processing failed for variant '{variant}'")]
    ProcessingFailure {
        variant: String,
        #[source]
        cause: anyhow::Error,
    },

    #[error("storage write failed for key '{key}'")]
    StorageFailure {
        key: String,
        #[source]
        cause: anyhow::Error,
    },

    #[error("upload processing timed out")]
    ProcessingTimeout,
}

impl MediaError {
    /// Whether the client may retry the same request later without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediaError::RateLimitExceeded { .. }
                | MediaError::StorageFailure { .. }
                | MediaError::ProcessingTimeout
        )
    }
}
