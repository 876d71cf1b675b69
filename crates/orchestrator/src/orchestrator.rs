//! Admission control and worker ownership

use crate::request::{Admission, InferenceOutcome, InferenceRequest};
use crate::worker::{Job, Worker};
use crate::OrchestratorError;
use inference_engine::{EngineConfig, EngineError, InferenceBackend};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, error, info};

/// Orchestrator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Geometry of the engine the worker will load
    pub engine: EngineConfig,
}

/// Schedules single-flight inference on one background worker.
///
/// `model_ready` and `busy` are the only state shared between the
/// submission context and the worker; both are atomics because one side
/// writes while the other reads with no further synchronization.
pub struct Orchestrator {
    job_tx: Option<mpsc::Sender<Job>>,
    model_ready: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Start the worker thread and return the orchestrator plus the
    /// channel outcomes are delivered on.
    ///
    /// The loader runs on the worker (session create may block for
    /// seconds); until it succeeds every submission is rejected as
    /// not-ready. A failed load posts one model-unavailable outcome and
    /// leaves the gate closed for good.
    pub fn spawn<F>(
        config: OrchestratorConfig,
        loader: F,
    ) -> Result<(Self, UnboundedReceiver<InferenceOutcome>), OrchestratorError>
    where
        F: FnOnce() -> Result<Box<dyn InferenceBackend>, EngineError> + Send + 'static,
    {
        let (job_tx, job_rx) = mpsc::channel();
        let (outcome_tx, outcome_rx) = unbounded_channel();
        let model_ready = Arc::new(AtomicBool::new(false));
        let busy = Arc::new(AtomicBool::new(false));

        let worker = Worker::new(
            config.engine,
            job_rx,
            outcome_tx,
            Arc::clone(&model_ready),
            Arc::clone(&busy),
        );
        let handle = std::thread::Builder::new()
            .name("inference-worker".into())
            .spawn(move || worker.run(loader))
            .map_err(|e| OrchestratorError::WorkerSpawn(e.to_string()))?;

        info!("Orchestrator started");
        Ok((
            Self {
                job_tx: Some(job_tx),
                model_ready,
                busy,
                worker: Some(handle),
            },
            outcome_rx,
        ))
    }

    /// Whether the session has finished loading
    pub fn is_ready(&self) -> bool {
        self.model_ready.load(Ordering::Acquire)
    }

    /// Whether a request is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Try to admit a request. Never blocks.
    ///
    /// Gate order: not-ready first (no timer started), then the busy
    /// compare-exchange (the in-flight request is left undisturbed), then
    /// hand-off to the worker with the admission timestamp.
    pub fn submit(&self, request: InferenceRequest) -> Admission {
        if !self.model_ready.load(Ordering::Acquire) {
            debug!("Rejecting request {}: model loading", request.id);
            return Admission::NotReady;
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Rejecting request {}: busy", request.id);
            return Admission::Busy;
        }

        let job = Job {
            request,
            accepted_at: Instant::now(),
        };
        match &self.job_tx {
            Some(tx) if tx.send(job).is_ok() => Admission::Accepted,
            _ => {
                // Worker gone; nothing will clear the flag for us.
                self.busy.store(false, Ordering::Release);
                error!("Inference worker is not running");
                Admission::NotReady
            }
        }
    }

    /// Stop accepting work and join the worker, which releases the session.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Inference worker panicked");
            }
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}
