//! Upload orchestration: validate → admit → generate → persist → commit.
//!
//! The pipeline guarantees a caller observes either a fully populated
//! [`MediaAsset`] or no asset at all. Generate and persist run under the
//! configured processing deadline; on any failure past admission, persisted
//! blobs are deleted and the rate-limit admission is released before the
//! error is surfaced, so the caller never has cleanup to do.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use inkpost_core::{AssetPolicy, MediaAsset, MediaConfig, MediaError, UploadRequest};
use inkpost_storage::{BlobStore, KeyGenerator};
use tokio::sync::Mutex;

use crate::derivative::DerivativeGenerator;
use crate::rate_limit::UploadRateLimiter;
use crate::validator::UploadValidator;

pub struct UploadPipeline {
    config: Arc<MediaConfig>,
    validator: UploadValidator,
    rate_limiter: UploadRateLimiter,
    generator: DerivativeGenerator,
    keys: KeyGenerator,
    store: Arc<dyn BlobStore>,
}

impl UploadPipeline {
    pub fn new(config: MediaConfig, store: Arc<dyn BlobStore>) -> Self {
        let config = Arc::new(config);
        Self {
            validator: UploadValidator::new(config.clone()),
            rate_limiter: UploadRateLimiter::new(config.max_uploads_per_window, config.window),
            generator: DerivativeGenerator::new(
                config.output_format,
                config.webp_quality,
                config.max_concurrency,
            ),
            keys: KeyGenerator::new(config.key_prefix.clone(), config.output_format),
            store,
            config,
        }
    }

    /// The limiter is owned by the pipeline; embedders reach it here for
    /// periodic `purge_expired` sweeps.
    pub fn rate_limiter(&self) -> &UploadRateLimiter {
        &self.rate_limiter
    }

    /// Submit one upload. Returns the committed asset descriptor, or a typed
    /// error after all side effects have been rolled back.
    pub async fn submit(&self, request: UploadRequest) -> Result<MediaAsset, MediaError> {
        self.validator
            .validate(&request.content_type, request.size(), request.asset_type)?;

        let admission = self
            .rate_limiter
            .try_admit(request.user_id, request.asset_type, Utc::now())
            .await?;
        tracing::debug!(
            user = %request.user_id,
            asset_type = %request.asset_type,
            remaining = admission.remaining,
            "upload admitted"
        );

        // Rollback ledger. Keys are recorded *before* each put so a deadline
        // that drops the in-flight future can still delete half-written
        // blobs; delete is idempotent by the BlobStore contract.
        let persisted: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let policy = self.config.policy(request.asset_type);
        let work = self.generate_and_persist(&request, policy, persisted.clone());
        let outcome = match tokio::time::timeout(self.config.processing_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(MediaError::ProcessingTimeout),
        };

        match outcome {
            Ok(asset) => {
                tracing::info!(
                    user = %request.user_id,
                    asset_type = %request.asset_type,
                    variants = asset.variants.len(),
                    "upload committed"
                );
                Ok(asset)
            }
            Err(err) => {
                self.rollback(&persisted).await;
                self.rate_limiter
                    .release(request.user_id, request.asset_type, admission)
                    .await;
                tracing::warn!(
                    user = %request.user_id,
                    asset_type = %request.asset_type,
                    error = %err,
                    "upload rolled back"
                );
                Err(err)
            }
        }
    }

    async fn generate_and_persist(
        &self,
        request: &UploadRequest,
        policy: &AssetPolicy,
        persisted: Arc<Mutex<Vec<String>>>,
    ) -> Result<MediaAsset, MediaError> {
        let rendered = self
            .generator
            .generate(request.data.clone(), &policy.variants)
            .await?;

        let content_type = self.config.output_format.mime_type();
        let mut variants = BTreeMap::new();
        for (name, bytes) in rendered {
            let key = self
                .keys
                .variant_key(request.asset_type, request.user_id, &name);
            persisted.lock().await.push(key.clone());
            self.store
                .put(&key, bytes, content_type)
                .await
                .map_err(|e| MediaError::StorageFailure {
                    key: key.clone(),
                    cause: anyhow::Error::from(e),
                })?;
            variants.insert(name, key);
        }

        Ok(MediaAsset {
            owner_id: request.user_id,
            asset_type: request.asset_type,
            variants,
            created_at: Utc::now(),
        })
    }

    /// Best-effort deletion of every key recorded this request.
    async fn rollback(&self, persisted: &Mutex<Vec<String>>) {
        let keys = std::mem::take(&mut *persisted.lock().await);
        for key in keys {
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "rollback delete failed");
            }
        }
    }
}
