//! The response-finishing pipeline.
//!
//! Raw engine output always passes through [`sanitize`]; enhancement is
//! layered on top only when its backend is already loaded, under a time
//! budget, and only if it produces something worth keeping. The sanitized
//! text is the floor the caller can rely on in every other case.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backend::loader::BackendLoader;
use crate::backend::MIN_ENHANCED_LEN;
use crate::sanitize::sanitize;

pub const DEFAULT_ENHANCE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ResponseFinisher {
    loader: Arc<BackendLoader>,
    timeout: Duration,
}

impl ResponseFinisher {
    pub fn new(loader: Arc<BackendLoader>) -> Self {
        Self {
            loader,
            timeout: DEFAULT_ENHANCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Turns raw engine output into displayable text. Cannot fail and
    /// never waits on backend acquisition.
    pub async fn finish(&self, raw: &str) -> String {
        let sanitized = sanitize(raw);
        if sanitized.is_empty() {
            return sanitized;
        }

        if !self.loader.is_ready() {
            // Nudge acquisition so a later request may get enhancement,
            // then answer this one from the sanitized floor.
            self.loader.ensure_loaded();
            return sanitized;
        }

        match tokio::time::timeout(self.timeout, self.loader.enhance(&sanitized)).await {
            Ok(Ok(enhanced)) if enhanced.chars().count() >= MIN_ENHANCED_LEN => enhanced,
            Ok(Ok(_)) => {
                debug!("enhanced output below minimum length, keeping sanitized text");
                sanitized
            }
            Ok(Err(e)) => {
                debug!(error = %e, "enhancement failed, keeping sanitized text");
                sanitized
            }
            Err(_) => {
                debug!(budget_ms = self.timeout.as_millis() as u64, "enhancement timed out");
                sanitized
            }
        }
    }
}
