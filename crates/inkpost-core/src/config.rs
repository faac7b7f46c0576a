//! Configuration for the media upload pipeline.
//!
//! All configuration is provided by the embedding application; there is no
//! file format of its own. `MediaConfig::default()` carries the reference
//! values, `MediaConfig::from_env()` overrides the scalar knobs from the
//! environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{AssetType, OutputFormat, VariantSpec};

const MAX_UPLOADS_PER_WINDOW: u32 = 5;
const WINDOW_SECS: i64 = 3600;
const PROCESSING_TIMEOUT_SECS: u64 = 30;
const AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;
const COVER_MAX_BYTES: usize = 10 * 1024 * 1024;
const WEBP_QUALITY: f32 = 80.0;

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Per-asset-type upload policy: size ceiling, MIME allow-list, and the
/// ordered set of variants to generate.
#[derive(Clone, Debug)]
pub struct AssetPolicy {
    pub max_bytes: usize,
    pub allowed_types: Vec<String>,
    pub variants: Vec<VariantSpec>,
}

/// Top-level pipeline configuration.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub avatar: AssetPolicy,
    pub cover: AssetPolicy,
    /// Max admitted uploads per (user, asset type) per window.
    pub max_uploads_per_window: u32,
    /// Length of the fixed rate-limit window.
    pub window: chrono::Duration,
    /// Deadline for generate + persist of a single upload.
    pub processing_timeout: Duration,
    /// Cap on concurrent variant encodes within one upload.
    pub max_concurrency: usize,
    /// Namespace prefix for all storage keys.
    pub key_prefix: String,
    pub output_format: OutputFormat,
    pub webp_quality: f32,
}

impl MediaConfig {
    pub fn policy(&self, asset_type: AssetType) -> &AssetPolicy {
        match asset_type {
            AssetType::Avatar => &self.avatar,
            AssetType::Cover => &self.cover,
        }
    }

    /// Reference configuration with scalar knobs overridden from the
    /// environment (`INKPOST_*` variables). Unset or unparsable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.max_uploads_per_window =
            env_parse("INKPOST_MAX_UPLOADS_PER_WINDOW", MAX_UPLOADS_PER_WINDOW);
        config.window =
            chrono::Duration::seconds(env_parse("INKPOST_UPLOAD_WINDOW_SECS", WINDOW_SECS));
        config.processing_timeout = Duration::from_secs(env_parse(
            "INKPOST_PROCESSING_TIMEOUT_SECS",
            PROCESSING_TIMEOUT_SECS,
        ));
        config.max_concurrency = env_parse("INKPOST_MAX_CONCURRENCY", config.max_concurrency);
        if let Ok(prefix) = env::var("INKPOST_KEY_PREFIX") {
            if !prefix.trim().is_empty() {
                config.key_prefix = prefix;
            }
        }
        if let Some(format) = env::var("INKPOST_OUTPUT_FORMAT")
            .ok()
            .and_then(|v| OutputFormat::parse(&v))
        {
            config.output_format = format;
        }
        config
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        let image_types = vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
            "image/gif".to_string(),
        ];
        Self {
            avatar: AssetPolicy {
                max_bytes: AVATAR_MAX_BYTES,
                allowed_types: image_types.clone(),
                variants: vec![
                    VariantSpec::new("thumbnail", 64, 64),
                    VariantSpec::new("small", 128, 128),
                    VariantSpec::new("medium", 256, 256),
                    VariantSpec::new("large", 512, 512),
                ],
            },
            cover: AssetPolicy {
                max_bytes: COVER_MAX_BYTES,
                allowed_types: image_types,
                variants: vec![
                    VariantSpec::new("thumbnail", 320, 180),
                    VariantSpec::new("small", 640, 360),
                    VariantSpec::new("medium", 1280, 720),
                    VariantSpec::new("large", 1920, 1080),
                ],
            },
            max_uploads_per_window: MAX_UPLOADS_PER_WINDOW,
            window: chrono::Duration::seconds(WINDOW_SECS),
            processing_timeout: Duration::from_secs(PROCESSING_TIMEOUT_SECS),
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            key_prefix: "media".to_string(),
            output_format: OutputFormat::WebP,
            webp_quality: WEBP_QUALITY,
        }
    }
}
