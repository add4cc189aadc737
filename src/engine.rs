//! The generation-engine boundary.
//!
//! The engine that actually composes replies is a collaborator behind
//! [`Engine`]; the HTTP layer and the finishing pipeline only depend on
//! the trait. [`ValenceEngine`] is the built-in default: a small
//! mood-tracking responder that produces exactly the kind of raw,
//! marker-tagged, lowercase output the pipeline exists to clean up.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

#[async_trait]
pub trait Engine: Send + Sync {
    /// Produces a raw reply for one user message. May fail.
    async fn generate(&self, message: &str) -> Result<String>;

    /// Persists engine state to `path`.
    async fn save(&self, path: &str) -> Result<()>;

    /// Restores engine state from `path`.
    async fn load(&self, path: &str) -> Result<()>;
}

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "love", "like", "thanks", "nice", "happy", "cool", "yes", "fun",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "hate", "angry", "sad", "terrible", "awful", "wrong", "broken", "no", "problem",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EngineState {
    valence: f32,
    turns: u64,
}

/// Default reply engine: keeps a running valence over the conversation
/// and answers from a handful of templates, tagged the way the engine
/// protocol tags everything it emits.
pub struct ValenceEngine {
    state: Mutex<EngineState>,
}

impl ValenceEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
        }
    }
}

impl Default for ValenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for ValenceEngine {
    async fn generate(&self, message: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        state.turns += 1;
        state.valence = (state.valence * 0.8 + sentiment_shift(message)).clamp(-1.0, 1.0);

        let tag = if state.valence > 0.2 {
            "[positive]"
        } else if state.valence < -0.2 {
            "[negative]"
        } else {
            "[neutral]"
        };

        let reply = if message.trim().is_empty() {
            "i did not catch that. say it again".to_string()
        } else {
            let topic = topic_of(message);
            if state.valence > 0.2 {
                format!("that sounds good. tell me more about {topic}")
            } else if state.valence < -0.2 {
                format!("i hear the trouble with {topic}. walk me through it")
            } else {
                format!("i am thinking about {topic}. go on")
            }
        };

        Ok(format!("[NEXUS]: {tag}{reply}"))
    }

    async fn save(&self, path: &str) -> Result<()> {
        let state = self.state.lock().await;
        let json = serde_json::to_string_pretty(&*state)?;
        std::fs::write(path, json).with_context(|| format!("writing engine state to {path}"))?;
        info!(path, turns = state.turns, "engine state saved");
        Ok(())
    }

    async fn load(&self, path: &str) -> Result<()> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine state from {path}"))?;
        let loaded: EngineState =
            serde_json::from_str(&json).with_context(|| format!("parsing engine state in {path}"))?;
        info!(path, turns = loaded.turns, "engine state loaded");
        *self.state.lock().await = loaded;
        Ok(())
    }
}

fn sentiment_shift(message: &str) -> f32 {
    let mut shift = 0.0;
    for word in message.to_lowercase().split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        if POSITIVE_WORDS.contains(&word) {
            shift += 0.3;
        } else if NEGATIVE_WORDS.contains(&word) {
            shift -= 0.3;
        }
    }
    shift
}

/// Picks the last substantial word of the message as its topic.
fn topic_of(message: &str) -> String {
    message
        .split_whitespace()
        .rev()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|w| w.chars().count() >= 4)
        .map(|w| w.to_lowercase())
        .unwrap_or_else(|| "that".to_string())
}
