//! Storage key generation.
//!
//! Key construction is centralized here so every backend sees the same
//! layout. Uniqueness rests on the random token alone: the token is drawn
//! from a CSPRNG with ~95 bits of entropy, so no existence check or retry is
//! performed before a key is handed out, and byte-identical re-uploads always
//! receive fresh keys.

use chrono::Utc;
use inkpost_core::models::{AssetType, OutputFormat};
use rand::{distr::Alphanumeric, Rng};
use uuid::Uuid;

const TOKEN_LEN: usize = 16;

/// Produces unique, human-readable storage keys:
///
/// `{prefix}/{asset_type}/{owner_id}/{variant-}{timestamp_ms}-{token}.{ext}`
///
/// The extension is always the configured target format's, independent of the
/// original upload's format.
#[derive(Clone, Debug)]
pub struct KeyGenerator {
    prefix: String,
    format: OutputFormat,
}

impl KeyGenerator {
    pub fn new(prefix: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            prefix: prefix.into(),
            format,
        }
    }

    /// Key for one named variant of an asset.
    pub fn variant_key(&self, asset_type: AssetType, owner_id: Uuid, variant: &str) -> String {
        self.build(asset_type, owner_id, Some(variant))
    }

    /// Key for the canonical slot (no variant segment).
    pub fn original_key(&self, asset_type: AssetType, owner_id: Uuid) -> String {
        self.build(asset_type, owner_id, None)
    }

    fn build(&self, asset_type: AssetType, owner_id: Uuid, variant: Option<&str>) -> String {
        let timestamp_ms = Utc::now().timestamp_millis();
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        let variant_prefix = variant.map(|v| format!("{v}-")).unwrap_or_default();
        format!(
            "{}/{}/{}/{}{}-{}.{}",
            self.prefix,
            asset_type,
            owner_id,
            variant_prefix,
            timestamp_ms,
            token,
            self.format.extension()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> KeyGenerator {
        KeyGenerator::new("media", OutputFormat::WebP)
    }

    #[test]
    fn variant_key_layout() {
        let owner = Uuid::new_v4();
        let key = generator().variant_key(AssetType::Avatar, owner, "thumbnail");
        assert!(key.starts_with(&format!("media/avatar/{owner}/thumbnail-")));
        assert!(key.ends_with(".webp"));
    }

    #[test]
    fn original_key_omits_variant_segment() {
        let owner = Uuid::new_v4();
        let key = generator().original_key(AssetType::Cover, owner);
        let filename = key.rsplit('/').next().unwrap();
        // {timestamp}-{token}.webp: exactly one dash-separated token pair
        assert_eq!(filename.matches('-').count(), 1);
    }

    #[test]
    fn extension_follows_target_format() {
        let owner = Uuid::new_v4();
        let key = KeyGenerator::new("media", OutputFormat::Jpeg)
            .variant_key(AssetType::Avatar, owner, "small");
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn keys_are_unique_across_generations() {
        let generator = generator();
        let owner = Uuid::new_v4();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let key = generator.variant_key(AssetType::Avatar, owner, "thumbnail");
            assert!(seen.insert(key), "duplicate key generated");
        }
    }
}
