//! Session lifecycle
//!
//! At most one live session exists per process; the orchestrator's single
//! worker thread is the only caller, so the handle itself needs no locking.
//! State machine: Uncreated -> Creating -> Ready | Failed -> Released.
//! No transition leaves Released.

use crate::{EngineConfig, EngineError, InferenceBackend, TractBackend};
use std::path::Path;
use tensor_codec::{ImageTensor, MaskTensor, OutputBuffer};
use tracing::{error, info, warn};

/// Lifecycle state of the native inference resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uncreated,
    Creating,
    Ready,
    Failed,
    Released,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uncreated => "uncreated",
            SessionState::Creating => "creating",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
            SessionState::Released => "released",
        }
    }
}

/// Owns exactly one native inference resource
pub struct SessionHandle {
    state: SessionState,
    backend: Option<Box<dyn InferenceBackend>>,
}

impl SessionHandle {
    /// A handle with no resource yet
    pub fn new() -> Self {
        Self {
            state: SessionState::Uncreated,
            backend: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Create the session with the production tract backend.
    ///
    /// Blocking (file I/O plus model parse); run off the submission context.
    pub fn create(&mut self, model_path: &Path, config: &EngineConfig) -> Result<(), EngineError> {
        let path = model_path.to_path_buf();
        let config = *config;
        self.create_with(move || Ok(Box::new(TractBackend::load(&path, &config)?)))
    }

    /// Create the session from an arbitrary backend loader.
    ///
    /// Valid only from `Uncreated`; moves to `Creating` for the duration of
    /// the loader, then to `Ready` on success or `Failed` on error.
    pub fn create_with<F>(&mut self, loader: F) -> Result<(), EngineError>
    where
        F: FnOnce() -> Result<Box<dyn InferenceBackend>, EngineError>,
    {
        if self.state != SessionState::Uncreated {
            return Err(EngineError::InvalidState {
                expected: "uncreated".into(),
                actual: self.state.as_str().into(),
            });
        }

        self.state = SessionState::Creating;
        match loader() {
            Ok(backend) => {
                self.backend = Some(backend);
                self.state = SessionState::Ready;
                info!("Session ready");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                error!("Session create failed: {}", e);
                Err(e)
            }
        }
    }

    /// Run one inference. Valid only from `Ready`.
    pub fn infer(
        &self,
        image: &ImageTensor,
        mask: &MaskTensor,
    ) -> Result<OutputBuffer, EngineError> {
        let backend = match (&self.state, &self.backend) {
            (SessionState::Ready, Some(backend)) => backend,
            _ => {
                return Err(EngineError::InvalidState {
                    expected: "ready".into(),
                    actual: self.state.as_str().into(),
                })
            }
        };
        backend.infer(image, mask)
    }

    /// Free the native resource. Valid from `Ready` or `Failed`; any other
    /// state is a logged no-op, never a double free.
    pub fn release(&mut self) {
        match self.state {
            SessionState::Ready | SessionState::Failed => {
                self.backend = None;
                self.state = SessionState::Released;
                info!("Session released");
            }
            SessionState::Released => {
                warn!("Session already released");
            }
            SessionState::Uncreated | SessionState::Creating => {
                warn!("Release called before session existed (state: {})", self.state.as_str());
            }
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockBackend;

    fn ready_session() -> SessionHandle {
        let mut session = SessionHandle::new();
        session
            .create_with(|| Ok(Box::new(MockBackend::echo())))
            .unwrap();
        session
    }

    #[test]
    fn test_create_moves_to_ready() {
        let session = ready_session();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.is_ready());
    }

    #[test]
    fn test_failed_create_moves_to_failed() {
        let mut session = SessionHandle::new();
        let result = session.create_with(|| Err(EngineError::ModelLoad("corrupt file".into())));
        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_create_twice_is_rejected() {
        let mut session = ready_session();
        let result = session.create_with(|| Ok(Box::new(MockBackend::echo())));
        assert!(matches!(result, Err(EngineError::InvalidState { .. })));
        // the live resource is undisturbed
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_infer_requires_ready() {
        let image = ImageTensor::new(vec![0.5; 12], 2, 2).unwrap();
        let mask = MaskTensor::new(vec![0.0; 4], 2, 2).unwrap();

        let session = SessionHandle::new();
        assert!(matches!(
            session.infer(&image, &mask),
            Err(EngineError::InvalidState { .. })
        ));

        let mut released = ready_session();
        released.release();
        assert!(matches!(
            released.infer(&image, &mask),
            Err(EngineError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_infer_when_ready() {
        let session = ready_session();
        let image = ImageTensor::new(vec![0.5; 12], 2, 2).unwrap();
        let mask = MaskTensor::new(vec![0.0; 4], 2, 2).unwrap();
        let out = session.infer(&image, &mask).unwrap();
        assert_eq!(out.as_slice().len(), 12);
    }

    #[test]
    fn test_release_is_terminal_and_idempotent() {
        let mut session = ready_session();
        session.release();
        assert_eq!(session.state(), SessionState::Released);
        session.release(); // no-op
        assert_eq!(session.state(), SessionState::Released);

        let result = session.create_with(|| Ok(Box::new(MockBackend::echo())));
        assert!(matches!(result, Err(EngineError::InvalidState { .. })));
        assert_eq!(session.state(), SessionState::Released);
    }

    #[test]
    fn test_release_from_failed() {
        let mut session = SessionHandle::new();
        let _ = session.create_with(|| Err(EngineError::ModelLoad("corrupt file".into())));
        session.release();
        assert_eq!(session.state(), SessionState::Released);
    }
}
