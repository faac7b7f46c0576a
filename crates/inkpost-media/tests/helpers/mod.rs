#![allow(dead_code)]

//! Shared fixtures for the pipeline integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use inkpost_storage::{BlobStore, MemoryBlobStore, StorageError, StorageResult};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Encode a solid-color PNG of the given dimensions.
pub fn png_image(width: u32, height: u32) -> Bytes {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    Bytes::from(buffer)
}

/// Blob store wrapper that fails exactly one `put` (1-based index across the
/// store's lifetime) and delegates everything else to the in-memory backend.
pub struct FlakyBlobStore {
    pub inner: MemoryBlobStore,
    fail_on_put: usize,
    puts: AtomicUsize,
}

impl FlakyBlobStore {
    pub fn failing_on_put(fail_on_put: usize) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            fail_on_put,
            puts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on_put {
            return Err(StorageError::WriteFailed("injected put failure".into()));
        }
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }
}
