//! Inference Engine
//!
//! Owns the single native inference resource behind an explicit session
//! lifecycle. The engine ABI is the separate-tensor call shape: a planar
//! 1x3xHxW image and a 1x1xHxW mask in, an interleaved RGB float buffer out.
//! The production backend runs the ONNX model through tract-onnx; a mock
//! backend exists for tests.

mod backend;
mod config;
mod session;

pub use backend::{InferenceBackend, MockBackend, TractBackend};
pub use config::EngineConfig;
pub use session::{SessionHandle, SessionState};

use thiserror::Error;

/// Errors during session lifecycle and inference
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid session state: expected {expected}, was {actual}")]
    InvalidState { expected: String, actual: String },

    #[error(transparent)]
    Codec(#[from] tensor_codec::CodecError),
}
