//! Domain models for the media upload pipeline.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Category of uploaded media. Each asset type carries its own size limit,
/// MIME allow-list, and variant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Avatar,
    Cover,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Avatar => "avatar",
            AssetType::Cover => "cover",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named rendition of an uploaded image (e.g. `thumbnail` at 64x64).
///
/// Variant specs are configuration-defined and immutable; every asset type
/// owns one ordered set of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// One incoming upload attempt. Owned by the pipeline call that processes it
/// and discarded once that call finishes, success or failure.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub user_id: Uuid,
    pub asset_type: AssetType,
    pub data: Bytes,
    pub content_type: String,
}

impl UploadRequest {
    pub fn new(
        user_id: Uuid,
        asset_type: AssetType,
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            asset_type,
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Descriptor of a fully persisted upload.
///
/// Constructed only after every variant has been written to storage, so a
/// `MediaAsset` observable by callers always carries exactly one storage key
/// per configured variant spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub owner_id: Uuid,
    pub asset_type: AssetType,
    /// Variant name -> storage key.
    pub variants: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Output format for encoded variants.
///
/// The pipeline re-encodes every variant to a single target format regardless
/// of what the client uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "webp" => Some(OutputFormat::WebP),
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}
