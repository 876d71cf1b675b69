//! Inference Orchestrator
//!
//! The concurrency core of the pipeline. Exactly one request runs at a
//! time: a new submission while one is in flight is rejected, never queued.
//! A single dedicated worker thread serializes every session call (create
//! and infer), and outcomes travel back to the submitter's context over a
//! channel — one outcome per accepted request, success or failure.

mod orchestrator;
mod request;
mod worker;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use request::{Admission, InferenceOutcome, InferenceRequest};

use thiserror::Error;

/// Errors inside the inference worker. All of these are caught at the
/// worker boundary and converted into failure outcomes; none may kill the
/// worker thread.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Image decode/encode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Codec(#[from] tensor_codec::CodecError),

    #[error(transparent)]
    Engine(#[from] inference_engine::EngineError),

    #[error("Worker spawn failed: {0}")]
    WorkerSpawn(String),
}
