//! Inkpost Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared across the Inkpost media pipeline components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{AssetPolicy, MediaConfig};
pub use error::MediaError;
pub use models::{AssetType, MediaAsset, OutputFormat, UploadRequest, VariantSpec};
