//! Cache directory layout

use std::path::{Path, PathBuf};

/// Fixed file name the session loads the model from.
pub const MODEL_FILE_NAME: &str = "inference.onnx";

/// Subdirectory holding the mirrored sample images.
pub const IMAGES_DIR_NAME: &str = "images";

/// Relative path of the last rendered result.
pub const OUTPUT_IMAGE_REL_PATH: &str = "output/output_image.png";

/// Well-known paths under the writable cache root.
///
/// The session always loads `<cache_root>/inference.onnx`, so the bundled
/// model is copied under that fixed name regardless of its bundle name.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    cache_root: PathBuf,
}

impl ArtifactPaths {
    /// Create the layout for a cache root
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    /// The cache root itself
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Path the inference model is loaded from
    pub fn model_path(&self) -> PathBuf {
        self.cache_root.join(MODEL_FILE_NAME)
    }

    /// Directory holding the mirrored sample input image and mask
    pub fn images_dir(&self) -> PathBuf {
        self.cache_root.join(IMAGES_DIR_NAME)
    }

    /// Path the last inference result is written to
    pub fn output_image_path(&self) -> PathBuf {
        self.cache_root.join(OUTPUT_IMAGE_REL_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_root() {
        let paths = ArtifactPaths::new("/tmp/cache");
        assert_eq!(paths.model_path(), PathBuf::from("/tmp/cache/inference.onnx"));
        assert_eq!(paths.images_dir(), PathBuf::from("/tmp/cache/images"));
        assert_eq!(
            paths.output_image_path(),
            PathBuf::from("/tmp/cache/output/output_image.png")
        );
    }
}
