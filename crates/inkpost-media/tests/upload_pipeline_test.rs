//! End-to-end pipeline behavior: atomic commit, rollback, and quota
//! accounting across failure injection points.

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use inkpost_core::{AssetType, MediaConfig, MediaError, OutputFormat, UploadRequest};
use inkpost_media::UploadPipeline;
use inkpost_storage::{BlobStore, KeyGenerator, MemoryBlobStore};
use uuid::Uuid;

use helpers::{png_image, FlakyBlobStore};

fn avatar_request(user: Uuid) -> UploadRequest {
    UploadRequest::new(user, AssetType::Avatar, png_image(256, 256), "image/png")
}

fn pipeline_with_memory_store() -> (UploadPipeline, MemoryBlobStore) {
    let store = MemoryBlobStore::new();
    let pipeline = UploadPipeline::new(MediaConfig::default(), Arc::new(store.clone()));
    (pipeline, store)
}

#[tokio::test]
async fn successful_upload_commits_every_configured_variant() {
    let (pipeline, store) = pipeline_with_memory_store();
    let user = Uuid::new_v4();

    let asset = pipeline.submit(avatar_request(user)).await.unwrap();

    assert_eq!(asset.owner_id, user);
    assert_eq!(asset.asset_type, AssetType::Avatar);
    let expected: Vec<&str> = vec!["large", "medium", "small", "thumbnail"];
    let names: Vec<&str> = asset.variants.keys().map(String::as_str).collect();
    assert_eq!(names, expected);

    // One stored blob per variant, keys pairwise distinct.
    let keys: HashSet<&String> = asset.variants.values().collect();
    assert_eq!(keys.len(), 4);
    assert_eq!(store.len().await, 4);
    for key in asset.variants.values() {
        assert!(key.ends_with(".webp"));
    }
}

#[tokio::test]
async fn cover_upload_commits_the_cover_variant_set() {
    let (pipeline, store) = pipeline_with_memory_store();
    let user = Uuid::new_v4();

    let request = UploadRequest::new(user, AssetType::Cover, png_image(640, 480), "image/png");
    let asset = pipeline.submit(request).await.unwrap();

    assert_eq!(asset.asset_type, AssetType::Cover);
    assert_eq!(asset.variants.len(), 4);
    assert_eq!(store.len().await, 4);

    // Each stored variant landed exactly on the cover policy's dimensions.
    let expected = [
        ("thumbnail", (320, 180)),
        ("small", (640, 360)),
        ("medium", (1280, 720)),
        ("large", (1920, 1080)),
    ];
    for (name, dims) in expected {
        let key = &asset.variants[name];
        assert!(key.contains("/cover/"));
        let bytes = store.get(key).await.unwrap();
        let img = image::ImageReader::new(std::io::Cursor::new(&bytes[..]))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(image::GenericImageView::dimensions(&img), dims);
    }
}

#[tokio::test]
async fn oversized_upload_fails_before_consuming_quota() {
    let (pipeline, store) = pipeline_with_memory_store();
    let user = Uuid::new_v4();

    let oversized = UploadRequest::new(
        user,
        AssetType::Avatar,
        Bytes::from(vec![0u8; 6 * 1024 * 1024]),
        "image/png",
    );
    let err = pipeline.submit(oversized).await.unwrap_err();
    assert!(matches!(err, MediaError::FileTooLarge { .. }));
    assert!(store.is_empty().await);

    // The rejected attempt consumed no quota: all five slots remain.
    for _ in 0..5 {
        pipeline.submit(avatar_request(user)).await.unwrap();
    }
}

#[tokio::test]
async fn unlisted_mime_type_fails_before_consuming_quota() {
    let (pipeline, store) = pipeline_with_memory_store();
    let user = Uuid::new_v4();

    let request = UploadRequest::new(
        user,
        AssetType::Avatar,
        png_image(64, 64),
        "application/pdf",
    );
    let err = pipeline.submit(request).await.unwrap_err();
    assert!(matches!(err, MediaError::InvalidMimeType { .. }));
    assert!(store.is_empty().await);

    for _ in 0..5 {
        pipeline.submit(avatar_request(user)).await.unwrap();
    }
}

#[tokio::test]
async fn sixth_upload_in_window_is_rejected() {
    let (pipeline, _store) = pipeline_with_memory_store();
    let user = Uuid::new_v4();

    for _ in 0..5 {
        pipeline.submit(avatar_request(user)).await.unwrap();
    }

    let err = pipeline.submit(avatar_request(user)).await.unwrap_err();
    assert!(matches!(err, MediaError::RateLimitExceeded { reset_at } if reset_at > chrono::Utc::now()));
}

#[tokio::test]
async fn derivative_failure_rolls_back_and_refunds_quota() {
    let (pipeline, store) = pipeline_with_memory_store();
    let user = Uuid::new_v4();

    let corrupt = UploadRequest::new(
        user,
        AssetType::Avatar,
        Bytes::from_static(b"definitely not an image"),
        "image/png",
    );
    let err = pipeline.submit(corrupt).await.unwrap_err();
    assert!(matches!(err, MediaError::ProcessingFailure { .. }));

    // Nothing was persisted and the slot was refunded.
    assert!(store.is_empty().await);
    for _ in 0..5 {
        pipeline.submit(avatar_request(user)).await.unwrap();
    }
}

#[tokio::test]
async fn storage_failure_deletes_already_persisted_variants() {
    // Fail the 3rd of 4 puts: the first two persisted variants must be
    // deleted and the admission refunded.
    let store = Arc::new(FlakyBlobStore::failing_on_put(3));
    let pipeline = UploadPipeline::new(MediaConfig::default(), store.clone());
    let user = Uuid::new_v4();

    let err = pipeline.submit(avatar_request(user)).await.unwrap_err();
    assert!(matches!(err, MediaError::StorageFailure { .. }));
    assert!(store.inner.is_empty().await);

    // Puts 4+ succeed, so a retry commits and proves the slot was refunded.
    let asset = pipeline.submit(avatar_request(user)).await.unwrap();
    assert_eq!(asset.variants.len(), 4);
    assert_eq!(store.inner.len().await, 4);
}

#[tokio::test]
async fn timeout_rolls_back_and_refunds_quota() {
    let mut config = MediaConfig::default();
    config.processing_timeout = std::time::Duration::ZERO;
    let store = MemoryBlobStore::new();
    let pipeline = UploadPipeline::new(config, Arc::new(store.clone()));
    let user = Uuid::new_v4();

    let err = pipeline.submit(avatar_request(user)).await.unwrap_err();
    assert!(matches!(err, MediaError::ProcessingTimeout));
    assert!(store.is_empty().await);

    // All five slots are still available after the refund.
    for _ in 0..5 {
        pipeline
            .rate_limiter()
            .try_admit(user, AssetType::Avatar, chrono::Utc::now())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn keys_never_collide_across_simulated_concurrent_uploads() {
    let generator = Arc::new(KeyGenerator::new("media", OutputFormat::WebP));
    let user = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let generator = generator.clone();
        handles.push(tokio::spawn(async move {
            (0..100)
                .map(|_| generator.variant_key(AssetType::Avatar, user, "thumbnail"))
                .collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for key in handle.await.unwrap() {
            assert!(seen.insert(key), "duplicate storage key generated");
        }
    }
    assert_eq!(seen.len(), 10_000);
}
