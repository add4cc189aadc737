use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nexus_chat::backend::loader::BackendLoader;
use nexus_chat::backend::local::LocalModelBackend;
use nexus_chat::backend::ollama::OllamaBackend;
use nexus_chat::backend::{EnhanceBackend, NoBackend};
use nexus_chat::config::{BackendKind, Config};
use nexus_chat::engine::{Engine, ValenceEngine};
use nexus_chat::finisher::ResponseFinisher;
use nexus_chat::server::{run_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!(addr = %config.addr, backend = ?config.backend, "starting nexus chat service");

    let backend: Arc<dyn EnhanceBackend> = match config.backend {
        BackendKind::None => Arc::new(NoBackend),
        BackendKind::Local => Arc::new(LocalModelBackend::new(
            config.model_repo.clone(),
            config.model_file.clone(),
            config.max_new_tokens,
        )),
        BackendKind::Ollama => Arc::new(OllamaBackend::new(
            config.ollama_host.clone(),
            config.ollama_port,
            config.ollama_model.clone(),
        )),
    };

    // Kick off acquisition now; requests are served from the sanitize-only
    // floor until it completes.
    let loader = Arc::new(BackendLoader::new(backend));
    loader.ensure_loaded();

    let finisher = Arc::new(ResponseFinisher::new(loader).with_timeout(config.enhance_timeout));
    let engine: Arc<dyn Engine> = Arc::new(ValenceEngine::new());

    let state = AppState {
        engine,
        finisher,
        state_file: config.state_file.clone(),
    };
    run_server(state, &config.addr).await
}
