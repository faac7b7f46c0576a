//! Upload validation.
//!
//! Pure checks against the per-asset-type policy: declared MIME type must be
//! on the allow-list, size must be under the ceiling. The declared type is
//! trusted at this layer; the pipeline re-encodes everything to one target
//! format, so content sniffing happens implicitly at decode time.
//! Validation runs before rate-limit admission, so a rejected upload never
//! consumes quota.

use std::sync::Arc;

use inkpost_core::{AssetType, MediaConfig, MediaError};

pub struct UploadValidator {
    config: Arc<MediaConfig>,
}

impl UploadValidator {
    pub fn new(config: Arc<MediaConfig>) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        content_type: &str,
        size: usize,
        asset_type: AssetType,
    ) -> Result<(), MediaError> {
        let policy = self.config.policy(asset_type);

        if size == 0 {
            return Err(MediaError::EmptyFile);
        }
        if size > policy.max_bytes {
            return Err(MediaError::FileTooLarge {
                size,
                max: policy.max_bytes,
            });
        }

        let normalized = content_type.to_lowercase();
        if !policy.allowed_types.iter().any(|t| t == &normalized) {
            return Err(MediaError::InvalidMimeType {
                content_type: content_type.to_string(),
                allowed: policy.allowed_types.clone(),
            });
        }

        Ok(())
    }
}
