//! Engine configuration

use serde::{Deserialize, Serialize};

/// Input geometry the model was exported with.
///
/// Inputs are resized to exactly this size before encoding; the model
/// rejects any other shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model input width (pixels)
    pub width: u32,
    /// Model input height (pixels)
    pub height: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
        }
    }
}
