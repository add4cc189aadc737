//! Lifecycle management for the enhancement backend.
//!
//! Acquisition (artifact download, session construction) takes seconds
//! and must never sit on the request path: the loader runs it once on a
//! spawned task and publishes progress through an atomic state that
//! request handlers only ever read.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::{EnhanceBackend, EnhanceError};

const UNLOADED: u8 = 0;
const LOADING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl BackendState {
    fn from_u8(value: u8) -> Self {
        match value {
            UNLOADED => BackendState::Unloaded,
            LOADING => BackendState::Loading,
            READY => BackendState::Ready,
            _ => BackendState::Failed,
        }
    }
}

/// Owns one enhancement backend and its load lifecycle.
///
/// Constructed once at wiring time and shared as `Arc<BackendLoader>`.
/// State only moves `Unloaded -> Loading -> Ready | Failed`; `Ready` and
/// `Failed` are terminal for the process lifetime, so a failed backend
/// stays failed until restart and is never re-fetched mid-run.
pub struct BackendLoader {
    backend: Arc<dyn EnhanceBackend>,
    state: Arc<AtomicU8>,
}

impl BackendLoader {
    pub fn new(backend: Arc<dyn EnhanceBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(AtomicU8::new(UNLOADED)),
        }
    }

    /// Triggers acquisition if it has not started yet and returns the
    /// current state without waiting. Exactly one caller wins the
    /// `Unloaded -> Loading` transition; everyone else observes whatever
    /// state the load task has reached.
    pub fn ensure_loaded(&self) -> BackendState {
        if self
            .state
            .compare_exchange(UNLOADED, LOADING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let backend = self.backend.clone();
            let state = self.state.clone();
            tokio::spawn(async move {
                info!(backend = backend.name(), "acquiring enhancement backend");
                match backend.load().await {
                    Ok(()) => {
                        state.store(READY, Ordering::SeqCst);
                        info!(backend = backend.name(), "enhancement backend ready");
                    }
                    Err(e) => {
                        state.store(FAILED, Ordering::SeqCst);
                        warn!(
                            backend = backend.name(),
                            error = %e,
                            "enhancement backend unavailable, serving sanitized text only"
                        );
                    }
                }
            });
        }
        self.state()
    }

    pub fn state(&self) -> BackendState {
        BackendState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Fast check used on the request path.
    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Relaxed) == READY
    }

    /// Delegates one rewrite pass to the backend. Callers are expected to
    /// have seen `is_ready()`; a race with a concurrent load is answered
    /// with `NotReady` rather than a wait.
    pub async fn enhance(&self, text: &str) -> Result<String, EnhanceError> {
        if !self.is_ready() {
            return Err(EnhanceError::NotReady);
        }
        self.backend.enhance(text).await
    }
}
