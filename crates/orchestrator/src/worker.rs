//! Inference worker
//!
//! The one thread allowed to touch the session. It creates the session,
//! publishes readiness, then serves accepted jobs strictly one at a time.
//! Every failure is converted to an outcome value at this boundary; a dead
//! worker would wedge the orchestrator permanently.

use crate::request::{InferenceOutcome, InferenceRequest};
use crate::OrchestratorError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use inference_engine::{EngineConfig, EngineError, InferenceBackend, SessionHandle};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// An admitted request plus the timestamp recorded at admission
pub(crate) struct Job {
    pub request: InferenceRequest,
    pub accepted_at: Instant,
}

pub(crate) struct Worker {
    engine: EngineConfig,
    job_rx: mpsc::Receiver<Job>,
    outcome_tx: UnboundedSender<InferenceOutcome>,
    model_ready: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
}

impl Worker {
    pub(crate) fn new(
        engine: EngineConfig,
        job_rx: mpsc::Receiver<Job>,
        outcome_tx: UnboundedSender<InferenceOutcome>,
        model_ready: Arc<AtomicBool>,
        busy: Arc<AtomicBool>,
    ) -> Self {
        Self {
            engine,
            job_rx,
            outcome_tx,
            model_ready,
            busy,
        }
    }

    /// Worker main loop. Runs until the job channel closes, then releases
    /// the session exactly once.
    pub(crate) fn run<F>(self, loader: F)
    where
        F: FnOnce() -> Result<Box<dyn InferenceBackend>, EngineError>,
    {
        let mut session = SessionHandle::new();

        match session.create_with(loader) {
            Ok(()) => {
                self.model_ready.store(true, Ordering::Release);
                info!("Inference worker ready");
            }
            Err(e) => {
                // No retry: the gate stays closed and every submit is
                // rejected as not-ready. Surface the failure once.
                let _ = self.outcome_tx.send(InferenceOutcome::Failure {
                    request_id: None,
                    error: format!("model unavailable: {}", e),
                    duration: Duration::ZERO,
                });
            }
        }

        while let Ok(job) = self.job_rx.recv() {
            let outcome = self.process(&session, job);
            // Re-arm the submission path before delivery; outcome order is
            // still FIFO because only this thread posts outcomes.
            self.busy.store(false, Ordering::Release);
            if self.outcome_tx.send(outcome).is_err() {
                debug!("Outcome receiver dropped");
            }
        }

        session.release();
        info!("Inference worker stopped");
    }

    /// Run one job, converting any failure into an outcome value.
    fn process(&self, session: &SessionHandle, job: Job) -> InferenceOutcome {
        let Job {
            request,
            accepted_at,
        } = job;
        debug!(
            "Processing request {} from {} (submitted {})",
            request.id, request.source_label, request.submitted_at
        );

        match self.run_pipeline(session, &request) {
            Ok(output_png) => {
                let duration = accepted_at.elapsed();
                info!(
                    "Request {} completed in {}ms",
                    request.id,
                    duration.as_millis()
                );
                InferenceOutcome::Success {
                    request_id: request.id,
                    source_label: request.source_label,
                    input_png: request.image_bytes,
                    output_png,
                    duration,
                }
            }
            Err(e) => {
                let duration = accepted_at.elapsed();
                warn!("Request {} failed after {}ms: {}", request.id, duration.as_millis(), e);
                InferenceOutcome::Failure {
                    request_id: Some(request.id),
                    error: e.to_string(),
                    duration,
                }
            }
        }
    }

    /// decode -> resize -> encode tensors -> infer -> decode -> PNG
    fn run_pipeline(
        &self,
        session: &SessionHandle,
        request: &InferenceRequest,
    ) -> Result<Vec<u8>, OrchestratorError> {
        let (width, height) = (self.engine.width, self.engine.height);

        let image = image::load_from_memory(&request.image_bytes)?.to_rgb8();
        let mask = image::load_from_memory(&request.mask_bytes)?.to_rgb8();
        let image = fit_to(image, width, height);
        let mask = fit_to(mask, width, height);

        let (image_tensor, mask_tensor) =
            tensor_codec::encode_input(&image, &mask, width, height)?;
        let output = session.infer(&image_tensor, &mask_tensor)?;
        let result = tensor_codec::decode_output(&output);

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(result).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

/// Resize to exactly the target geometry if needed
fn fit_to(image: RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() == width && image.height() == height {
        return image;
    }
    image::imageops::resize(&image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_fit_to_is_identity_for_exact_size() {
        let image = RgbImage::from_pixel(8, 8, Rgb([9, 9, 9]));
        let fitted = fit_to(image.clone(), 8, 8);
        assert_eq!(fitted, image);
    }

    #[test]
    fn test_fit_to_resizes() {
        let image = RgbImage::from_pixel(16, 4, Rgb([10, 20, 30]));
        let fitted = fit_to(image, 8, 8);
        assert_eq!((fitted.width(), fitted.height()), (8, 8));
    }
}
