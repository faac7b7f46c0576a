//! Inkpost Storage Library
//!
//! Blob persistence abstraction for the media pipeline. The pipeline treats
//! storage as an opaque key/value blob store behind the [`BlobStore`] trait;
//! this crate ships a local-filesystem backend and an in-memory backend.
//!
//! # Storage key format
//!
//! All keys are produced by [`KeyGenerator`] and share one layout:
//!
//! `{prefix}/{asset_type}/{owner_id}/{variant-}{timestamp_ms}-{token}.{ext}`
//!
//! The variant segment is omitted for the canonical slot. Keys must not
//! contain `..` or a leading `/`.

pub mod keys;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use keys::KeyGenerator;
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use traits::{BlobStore, StorageError, StorageResult};
