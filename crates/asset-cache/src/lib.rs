//! Asset Cache
//!
//! Mirrors the read-only asset bundle (model weights, sample images) into a
//! writable cache directory before the inference session starts. Copies are
//! best-effort and idempotent: files already present in the cache are never
//! rewritten.

mod materializer;
mod paths;

pub use materializer::{MaterializeReport, Materializer};
pub use paths::{ArtifactPaths, IMAGES_DIR_NAME, MODEL_FILE_NAME, OUTPUT_IMAGE_REL_PATH};

use thiserror::Error;

/// Asset cache error types
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Source path not found: {0}")]
    SourceMissing(String),

    #[error("Cache directory unusable: {0}")]
    CacheUnusable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
