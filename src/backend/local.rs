//! Locally hosted enhancement via ONNX Runtime.
//!
//! The decoder and its tokenizer are fetched from the Hugging Face hub on
//! first load (a cached copy is reused), the session is built with
//! single-threaded intra-op execution, and each enhancement call is one
//! greedy decode bounded by a new-token cap. Everything heavy runs on
//! blocking threads; the async surface only coordinates.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::TensorRef;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::{build_instruction, polish_model_output, EnhanceBackend, EnhanceError};

/// Token IDs that terminate generation, whichever the vocabulary defines.
const END_TOKENS: &[&str] = &["<eos>", "<end_of_turn>", "</s>"];

pub struct LocalModelBackend {
    repo_id: String,
    model_file: String,
    max_new_tokens: usize,
    session: Arc<Mutex<Option<Session>>>,
    tokenizer: Arc<Mutex<Option<Tokenizer>>>,
}

impl LocalModelBackend {
    pub fn new(
        repo_id: impl Into<String>,
        model_file: impl Into<String>,
        max_new_tokens: usize,
    ) -> Self {
        Self {
            repo_id: repo_id.into(),
            model_file: model_file.into(),
            max_new_tokens,
            session: Arc::new(Mutex::new(None)),
            tokenizer: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl EnhanceBackend for LocalModelBackend {
    fn name(&self) -> &'static str {
        "local-onnx"
    }

    async fn load(&self) -> Result<(), EnhanceError> {
        let repo_id = self.repo_id.clone();
        let model_file = self.model_file.clone();
        let session_slot = self.session.clone();
        let tokenizer_slot = self.tokenizer.clone();

        tokio::task::spawn_blocking(move || -> Result<(), EnhanceError> {
            let (model_path, tokenizer_path) = fetch_artifacts(&repo_id, &model_file)?;
            info!(model = %model_path.display(), "model artifact available");

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| EnhanceError::Artifact(e.to_string()))?;
            let session = build_session(&model_path)?;

            *tokenizer_slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(tokenizer);
            *session_slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session);
            Ok(())
        })
        .await
        .map_err(|e| EnhanceError::Session(e.to_string()))?
    }

    async fn enhance(&self, text: &str) -> Result<String, EnhanceError> {
        let prompt = build_instruction(text);
        let session = self.session.clone();
        let tokenizer = self.tokenizer.clone();
        let max_new_tokens = self.max_new_tokens;

        let raw = tokio::task::spawn_blocking(move || -> Result<String, EnhanceError> {
            let tokenizer_guard = tokenizer.lock().unwrap_or_else(|e| e.into_inner());
            let tokenizer = tokenizer_guard.as_ref().ok_or(EnhanceError::NotReady)?;
            let mut session_guard = session.lock().unwrap_or_else(|e| e.into_inner());
            let session = session_guard.as_mut().ok_or(EnhanceError::NotReady)?;
            generate_once(session, tokenizer, &prompt, max_new_tokens)
        })
        .await
        .map_err(|e| EnhanceError::Inference(e.to_string()))??;

        debug!(len = raw.len(), "local model produced output");
        polish_model_output(&raw)
    }
}

/// Resolves the model and tokenizer paths, downloading when absent from
/// the local hub cache.
fn fetch_artifacts(repo_id: &str, model_file: &str) -> Result<(PathBuf, PathBuf), EnhanceError> {
    use hf_hub::{api::sync::ApiBuilder, Repo};

    let mut builder = ApiBuilder::new().with_progress(false);
    if let Ok(token) = std::env::var("HF_TOKEN") {
        builder = builder.with_token(Some(token));
    }
    let api = builder
        .build()
        .map_err(|e| EnhanceError::Artifact(e.to_string()))?;
    let repo = api.repo(Repo::new(repo_id.to_string(), hf_hub::RepoType::Model));

    let model_path = repo
        .get(model_file)
        .map_err(|e| EnhanceError::Artifact(e.to_string()))?;
    let tokenizer_path = repo
        .get("tokenizer.json")
        .map_err(|e| EnhanceError::Artifact(e.to_string()))?;
    Ok((model_path, tokenizer_path))
}

fn build_session(model_path: &Path) -> Result<Session, EnhanceError> {
    SessionBuilder::new()
        .map_err(|e| EnhanceError::Session(e.to_string()))?
        .with_intra_threads(1)
        .map_err(|e| EnhanceError::Session(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::All)
        .map_err(|e| EnhanceError::Session(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| EnhanceError::Session(e.to_string()))
}

/// One greedy decode pass: feed the running token sequence, take the
/// argmax of the last logits row, stop at an end token or the cap, and
/// decode only the generated suffix.
fn generate_once(
    session: &mut Session,
    tokenizer: &Tokenizer,
    prompt: &str,
    max_new_tokens: usize,
) -> Result<String, EnhanceError> {
    let encoding = tokenizer
        .encode(prompt, true)
        .map_err(|e| EnhanceError::Inference(e.to_string()))?;
    let mut tokens: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    if tokens.is_empty() {
        return Err(EnhanceError::Degenerate);
    }
    let prompt_len = tokens.len();

    let end_ids: Vec<i64> = END_TOKENS
        .iter()
        .filter_map(|t| tokenizer.token_to_id(t))
        .map(|id| id as i64)
        .collect();

    for _ in 0..max_new_tokens {
        let seq = tokens.len();
        let input_ids = TensorRef::from_array_view(([1_i64, seq as i64], tokens.as_slice()))
            .map_err(|e| EnhanceError::Inference(e.to_string()))?;
        let outputs = session
            .run(ort::inputs!["input_ids" => input_ids])
            .map_err(|e| EnhanceError::Inference(e.to_string()))?;
        let (_, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(|e| EnhanceError::Inference(e.to_string()))?;

        // logits are flat [1 * seq * vocab]; only the last row matters.
        let vocab = logits.len() / seq;
        let last_row = &logits[(seq - 1) * vocab..seq * vocab];
        let next = last_row
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i as i64)
            .ok_or_else(|| EnhanceError::Inference("empty logits row".into()))?;

        if end_ids.contains(&next) {
            break;
        }
        tokens.push(next);
    }

    if tokens.len() == prompt_len {
        return Err(EnhanceError::Degenerate);
    }
    let generated: Vec<u32> = tokens[prompt_len..].iter().map(|&t| t as u32).collect();
    tokenizer
        .decode(&generated, true)
        .map_err(|e| EnhanceError::Inference(e.to_string()))
}
