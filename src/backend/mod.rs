//! The optional enhancement capability.
//!
//! An enhancement backend rewrites already-sanitized text into more
//! natural phrasing with a language model. Backends are swappable behind
//! [`EnhanceBackend`] and selected at wiring time; every realization is
//! best-effort and every failure is converted into [`EnhanceError`] so
//! nothing from this layer can reach an HTTP caller.

pub mod loader;
pub mod local;
pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

use crate::sanitize::{
    capitalize_first, collapse_spaces, ensure_terminal_punct, tighten_punct,
};

/// Post-processed model output shorter than this is treated as a
/// non-improvement and rejected.
pub const MIN_ENHANCED_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("enhancement backend disabled")]
    Disabled,
    #[error("enhancement backend not ready")]
    NotReady,
    #[error("model artifact unavailable: {0}")]
    Artifact(String),
    #[error("inference session error: {0}")]
    Session(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model produced degenerate output")]
    Degenerate,
}

/// A swappable enhancement strategy.
///
/// `load` performs the expensive one-time acquisition (artifact fetch,
/// session construction, daemon ping). It is driven by the
/// [`loader::BackendLoader`] off the request path; `enhance` is only
/// called once the loader reports ready.
#[async_trait]
pub trait EnhanceBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<(), EnhanceError>;

    /// One bounded rewrite pass over sanitized text.
    async fn enhance(&self, text: &str) -> Result<String, EnhanceError>;
}

/// The null strategy: never loads, never enhances. Used when no
/// enhancement backend is configured.
pub struct NoBackend;

#[async_trait]
impl EnhanceBackend for NoBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn load(&self) -> Result<(), EnhanceError> {
        Err(EnhanceError::Disabled)
    }

    async fn enhance(&self, _text: &str) -> Result<String, EnhanceError> {
        Err(EnhanceError::Disabled)
    }
}

/// Instruction wrapped around the sanitized text for one rewrite pass.
/// Identical across backends so their behavior stays comparable.
pub(crate) fn build_instruction(text: &str) -> String {
    format!(
        "Fix the grammar and rewrite this as natural, plain text. \
         Reply with only the rewritten text.\n\n{text}"
    )
}

/// Lead-in phrases chat models like to prepend despite the instruction.
/// Longest first so the most specific match wins.
const BOILERPLATE_PREFIXES: &[&str] = &[
    "here is the rewritten text:",
    "here is the corrected text:",
    "the rewritten text is:",
    "the corrected text is:",
    "here is the text:",
    "this means that",
    "rewritten text:",
    "this means:",
    "this means",
    "here is",
    "here's",
    "certainly,",
    "certainly:",
    "sure,",
    "sure:",
];

/// Normalizes raw model output before it may replace sanitized text.
///
/// Model output is untrusted: it arrives quoted, padded, prefixed with
/// chat boilerplate, or cut short. Padding and boilerplate are stripped,
/// the sanitizer's invariants are reapplied, and anything shorter than
/// [`MIN_ENHANCED_LEN`] is rejected as degenerate.
pub(crate) fn polish_model_output(raw: &str) -> Result<String, EnhanceError> {
    let flattened: String = raw
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();
    let mut text = flattened
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string();

    let lowered = text.to_lowercase();
    for prefix in BOILERPLATE_PREFIXES {
        if lowered.starts_with(prefix) {
            text = text[prefix.len()..].trim_start().to_string();
            break;
        }
    }

    if text.is_empty() {
        return Err(EnhanceError::Degenerate);
    }

    let text = capitalize_first(text.trim());
    let text = ensure_terminal_punct(&text);
    let text = collapse_spaces(&text);
    let text = tighten_punct(&text);

    if text.chars().count() < MIN_ENHANCED_LEN {
        return Err(EnhanceError::Degenerate);
    }
    Ok(text)
}
