//! Tensor Codec
//!
//! Converts decoded images and single-channel masks into the fixed NCHW
//! float layout the inference engine consumes, and converts the engine's
//! float output back into a displayable RGB image.
//!
//! Layout contract:
//! - image tensor: 1x3xHxW, planar (all R, then G, then B), values 0..1
//! - mask tensor:  1x1xHxW, single plane (red channel), values 0..1
//! - output buffer: HxWx3 row-major interleaved RGB, values nominally 0..255

mod codec;
mod tensor;

pub use codec::{decode_output, encode_input};
pub use tensor::{ImageTensor, MaskTensor, OutputBuffer};

use thiserror::Error;

/// Codec error types
#[derive(Error, Debug)]
pub enum CodecError {
    /// Buffer length disagrees with the declared geometry. This is a
    /// contract violation by the caller, never silently truncated.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The engine produced a channel count the codec cannot display.
    #[error("Unsupported channel count: {0} (only 1 or 3)")]
    UnsupportedChannels(usize),
}
