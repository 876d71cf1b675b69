//! Request and outcome types

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// One unit of inference work, consumed exactly once.
///
/// Requests are never buffered: if the worker is busy the submission is
/// rejected and the caller resubmits with fresh input.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Correlation id for logs and outcomes
    pub id: Uuid,
    /// Encoded input image (PNG/JPEG)
    pub image_bytes: Vec<u8>,
    /// Encoded mask image; its red channel selects the inpainted region
    pub mask_bytes: Vec<u8>,
    /// Where the input came from (camera, gallery, sample)
    pub source_label: String,
    /// Wall-clock submission time
    pub submitted_at: DateTime<Utc>,
}

impl InferenceRequest {
    /// Build a request from caller-supplied bytes
    pub fn new(
        image_bytes: Vec<u8>,
        mask_bytes: Vec<u8>,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_bytes,
            mask_bytes,
            source_label: source_label.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Synchronous verdict of `submit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request was handed to the worker; one outcome will follow
    Accepted,
    /// The session is not ready yet (still loading, or load failed)
    NotReady,
    /// Another request is in flight; try again after its outcome
    Busy,
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

/// Terminal result of one accepted request
#[derive(Debug, Clone)]
pub enum InferenceOutcome {
    Success {
        request_id: Uuid,
        source_label: String,
        /// Echo of the submitted image bytes
        input_png: Vec<u8>,
        /// PNG-encoded inpainted result
        output_png: Vec<u8>,
        /// Elapsed from admission to completion
        duration: Duration,
    },
    Failure {
        /// None for the model-unavailable outcome posted before any request
        request_id: Option<Uuid>,
        error: String,
        duration: Duration,
    },
}

impl InferenceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InferenceOutcome::Success { .. })
    }

    pub fn duration(&self) -> Duration {
        match self {
            InferenceOutcome::Success { duration, .. } => *duration,
            InferenceOutcome::Failure { duration, .. } => *duration,
        }
    }
}
