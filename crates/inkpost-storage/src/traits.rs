//! Storage abstraction trait
//!
//! This module defines the [`BlobStore`] trait that all storage backends must
//! implement. The upload pipeline only ever talks to storage through this
//! trait, so backends can be swapped without touching orchestration code.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Opaque blob persistence.
///
/// A successful `put` is assumed durable. `delete` is idempotent by contract:
/// deleting an absent key is not an error, which lets the pipeline's rollback
/// path delete the same key twice without caring.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist a blob under the given key.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Fetch a blob by key.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Remove a blob by key. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether a blob exists under the given key.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
