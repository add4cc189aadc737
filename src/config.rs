//! Environment-driven configuration.
//!
//! Every knob has a default that yields a working sanitize-only service;
//! `NEXUS_BACKEND` opts into an enhancement backend.

use std::env;
use std::time::Duration;

/// Which enhancement backend to wire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Sanitize-only pipeline.
    None,
    /// In-process ONNX session over a hub-fetched model.
    Local,
    /// Model hosted by a separate Ollama process.
    Ollama,
}

impl BackendKind {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "local" | "onnx" => BackendKind::Local,
            "ollama" => BackendKind::Ollama,
            _ => BackendKind::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP surface.
    pub addr: String,
    pub backend: BackendKind,
    /// Hub repository and file for the local backend's model artifact.
    pub model_repo: String,
    pub model_file: String,
    /// New-token cap for one enhancement pass.
    pub max_new_tokens: usize,
    pub ollama_host: String,
    pub ollama_port: u16,
    pub ollama_model: String,
    /// Per-request time budget for the enhancement call.
    pub enhance_timeout: Duration,
    /// Engine state file used by the save/load routes.
    pub state_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8090".to_string(),
            backend: BackendKind::None,
            model_repo: "onnx-community/gemma-3-1b-it-ONNX".to_string(),
            model_file: "onnx/model_q4.onnx".to_string(),
            max_new_tokens: 96,
            ollama_host: "http://127.0.0.1".to_string(),
            ollama_port: 11434,
            ollama_model: "llama3.2:3b".to_string(),
            enhance_timeout: Duration::from_secs(10),
            state_file: "state.dat".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: var_or("NEXUS_ADDR", defaults.addr),
            backend: env::var("NEXUS_BACKEND")
                .map(|v| BackendKind::parse(&v))
                .unwrap_or(defaults.backend),
            model_repo: var_or("NEXUS_MODEL_REPO", defaults.model_repo),
            model_file: var_or("NEXUS_MODEL_FILE", defaults.model_file),
            max_new_tokens: parsed_var_or("NEXUS_MAX_NEW_TOKENS", defaults.max_new_tokens),
            ollama_host: var_or("NEXUS_OLLAMA_HOST", defaults.ollama_host),
            ollama_port: parsed_var_or("NEXUS_OLLAMA_PORT", defaults.ollama_port),
            ollama_model: var_or("NEXUS_OLLAMA_MODEL", defaults.ollama_model),
            enhance_timeout: Duration::from_millis(parsed_var_or(
                "NEXUS_ENHANCE_TIMEOUT_MS",
                defaults.enhance_timeout.as_millis() as u64,
            )),
            state_file: var_or("NEXUS_STATE_FILE", defaults.state_file),
        }
    }
}

fn var_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parsed_var_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
