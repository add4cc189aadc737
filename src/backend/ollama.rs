//! Enhancement via a model hosted by a separate Ollama process.
//!
//! Same contract as the local realization, different execution context:
//! the daemon owns the weights and the session, this adapter owns one
//! chat call per enhancement with deterministic sampling.

use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    models::ModelOptions,
    Ollama,
};
use tracing::debug;

use super::{build_instruction, polish_model_output, EnhanceBackend, EnhanceError};

const SYSTEM_PROMPT: &str =
    "You rewrite short chat replies into clear, grammatical sentences. \
     Never add information. Reply with only the rewritten text.";

pub struct OllamaBackend {
    client: Ollama,
    model: String,
    max_tokens: i32,
}

impl OllamaBackend {
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        Self {
            client: Ollama::new(host.into(), port),
            model: model.into(),
            max_tokens: 96,
        }
    }
}

#[async_trait]
impl EnhanceBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    /// Ready means the daemon answers and the configured model is
    /// actually present; a missing model would otherwise fail every
    /// enhancement call one request at a time.
    async fn load(&self) -> Result<(), EnhanceError> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| EnhanceError::Session(e.to_string()))?;
        debug!(count = models.len(), "ollama daemon reachable");

        if !models.iter().any(|m| m.name == self.model) {
            return Err(EnhanceError::Artifact(format!(
                "model '{}' not present in ollama",
                self.model
            )));
        }
        Ok(())
    }

    async fn enhance(&self, text: &str) -> Result<String, EnhanceError> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT.to_string()),
            ChatMessage::user(build_instruction(text)),
        ];
        let request = ChatMessageRequest::new(self.model.clone(), messages).options(
            ModelOptions::default()
                .temperature(0.0)
                .num_predict(self.max_tokens),
        );

        let res = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| EnhanceError::Inference(e.to_string()))?;

        polish_model_output(&res.message.content)
    }
}
