//! Runner configuration

use config::{Config, ConfigError, Environment, File};
use inference_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runner configuration
///
/// Defaults mirror the shipped bundle layout; a `runner.toml` next to the
/// binary or `INPAINT_*` environment variables override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Read-only asset bundle directory
    pub bundle_dir: PathBuf,

    /// Writable cache root
    pub cache_root: PathBuf,

    /// Model file name inside the bundle (cached as `inference.onnx`)
    pub model_file: String,

    /// Sample input image, relative to the cache root after materialization
    pub sample_image: String,

    /// Sample mask, relative to the cache root after materialization
    pub sample_mask: String,

    /// Engine input geometry
    pub engine: EngineConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            bundle_dir: PathBuf::from("assets"),
            cache_root: PathBuf::from("cache"),
            model_file: "lama_fp32.onnx".to_string(),
            sample_image: "images/input_image.png".to_string(),
            sample_mask: "images/dilated_mask.png".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration: defaults, then `runner.toml`, then environment
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&RunnerConfig::default())?)
            .add_source(File::with_name("runner").required(false))
            .add_source(Environment::with_prefix("INPAINT").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_bundle_layout() {
        let config = RunnerConfig::default();
        assert_eq!(config.model_file, "lama_fp32.onnx");
        assert_eq!(config.sample_image, "images/input_image.png");
        assert_eq!(config.engine.width, 512);
        assert_eq!(config.engine.height, 512);
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let config = RunnerConfig::load().unwrap();
        assert_eq!(config.model_file, RunnerConfig::default().model_file);
    }
}
