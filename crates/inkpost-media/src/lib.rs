//! Inkpost Media Pipeline
//!
//! Media upload orchestration: validate → admit → generate → persist → commit.
//!
//! [`UploadPipeline::submit`] is the single entry point the surrounding HTTP
//! layer calls. A submission either commits a fully populated
//! [`inkpost_core::MediaAsset`] or fails with a typed
//! [`inkpost_core::MediaError`] after rolling back every side effect: partial
//! blob writes are deleted and the rate-limit admission is released, so quota
//! is only permanently consumed on a committed upload.

pub mod derivative;
pub mod pipeline;
pub mod rate_limit;
pub mod validator;

// Re-export commonly used types
pub use derivative::DerivativeGenerator;
pub use pipeline::UploadPipeline;
pub use rate_limit::{Admission, UploadRateLimiter};
pub use validator::UploadValidator;
