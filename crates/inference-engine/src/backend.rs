//! Engine backends
//!
//! The native ABI is fixed to the separate-tensor call: planar image and
//! mask tensors in, one float output buffer back per call.

use crate::{EngineConfig, EngineError};
use std::path::Path;
use tensor_codec::{ImageTensor, MaskTensor, OutputBuffer};
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// One coarse-grained blocking inference call.
///
/// Implementations must tolerate being called from a dedicated worker
/// thread; they are never called concurrently.
pub trait InferenceBackend: Send {
    fn infer(&self, image: &ImageTensor, mask: &MaskTensor) -> Result<OutputBuffer, EngineError>;
}

/// tract-onnx implementation of the engine ABI
pub struct TractBackend {
    plan: TypedSimplePlan<TypedModel>,
    width: u32,
    height: u32,
}

impl TractBackend {
    /// Load and optimize the model from the cache-resident path.
    ///
    /// Slow: file I/O plus model parse and graph optimization. Callers run
    /// this off their primary execution context.
    pub fn load(model_path: &Path, config: &EngineConfig) -> Result<Self, EngineError> {
        info!(
            "Loading inference model from {} ({}x{})",
            model_path.display(),
            config.width,
            config.height
        );

        let (w, h) = (config.width as usize, config.height as usize);
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?
            .with_input_fact(0, f32::fact([1, 3, h, w]).into())
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?
            .with_input_fact(1, f32::fact([1, 1, h, w]).into())
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?
            .into_optimized()
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?
            .into_runnable()
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?;

        info!("Model loaded and optimized");
        Ok(Self {
            plan,
            width: config.width,
            height: config.height,
        })
    }
}

impl InferenceBackend for TractBackend {
    fn infer(&self, image: &ImageTensor, mask: &MaskTensor) -> Result<OutputBuffer, EngineError> {
        if image.width() != self.width || image.height() != self.height {
            return Err(EngineError::InferenceFailed(format!(
                "image tensor is {}x{}, model expects {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }

        let (w, h) = (self.width as usize, self.height as usize);
        let image_value = Tensor::from_shape(&[1, 3, h, w], image.as_slice())
            .map_err(|e| EngineError::InferenceFailed(e.to_string()))?;
        let mask_value = Tensor::from_shape(&[1, 1, h, w], mask.as_slice())
            .map_err(|e| EngineError::InferenceFailed(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(image_value.into_tvalue(), mask_value.into_tvalue()))
            .map_err(|e| EngineError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| EngineError::InferenceFailed("model produced no outputs".into()))?;
        let planar = output
            .as_slice::<f32>()
            .map_err(|e| EngineError::InferenceFailed(e.to_string()))?;
        debug!("Inference produced {} floats", planar.len());

        Ok(OutputBuffer::from_planar(planar, self.width, self.height)?)
    }
}

/// Mock backend for tests: echoes the input image scaled back to 0..255,
/// or fails every call.
pub struct MockBackend {
    fail_with: Option<String>,
}

impl MockBackend {
    /// Backend that succeeds by echoing its input
    pub fn echo() -> Self {
        Self { fail_with: None }
    }

    /// Backend that fails every inference with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
        }
    }
}

impl InferenceBackend for MockBackend {
    fn infer(&self, image: &ImageTensor, _mask: &MaskTensor) -> Result<OutputBuffer, EngineError> {
        if let Some(message) = &self.fail_with {
            return Err(EngineError::InferenceFailed(message.clone()));
        }
        let scaled: Vec<f32> = image.as_slice().iter().map(|v| v * 255.0).collect();
        Ok(OutputBuffer::from_planar(
            &scaled,
            image.width(),
            image.height(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_codec::{ImageTensor, MaskTensor};

    #[test]
    fn test_mock_echo_scales_to_byte_range() {
        let image = ImageTensor::new(vec![1.0; 12], 2, 2).unwrap();
        let mask = MaskTensor::new(vec![0.0; 4], 2, 2).unwrap();

        let out = MockBackend::echo().infer(&image, &mask).unwrap();
        assert_eq!(out.as_slice().len(), 12);
        assert!(out.as_slice().iter().all(|&v| v == 255.0));
    }

    #[test]
    fn test_mock_failing_reports_message() {
        let image = ImageTensor::new(vec![0.0; 12], 2, 2).unwrap();
        let mask = MaskTensor::new(vec![0.0; 4], 2, 2).unwrap();

        let err = MockBackend::failing("bad op").infer(&image, &mask).unwrap_err();
        assert!(matches!(err, EngineError::InferenceFailed(m) if m == "bad op"));
    }
}
