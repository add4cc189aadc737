//! Nexus chat service.
//!
//! A small HTTP API that forwards user messages to a generation engine
//! and finishes the raw reply through a staged pipeline: rule-based
//! sanitization that is always available, plus optional model-backed
//! enhancement that loads in the background and degrades to the
//! sanitized text on any failure.

pub mod backend;
pub mod config;
pub mod engine;
pub mod finisher;
pub mod sanitize;
pub mod server;
pub mod ui;

// Re-exports for convenience
pub use finisher::ResponseFinisher;
pub use sanitize::sanitize;
