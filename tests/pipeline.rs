//! Cross-module pipeline behavior: the sanitize floor, the loader
//! lifecycle, and the finisher's fallback guarantees.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nexus_chat::backend::loader::{BackendLoader, BackendState};
use nexus_chat::backend::{EnhanceBackend, EnhanceError, NoBackend};
use nexus_chat::finisher::ResponseFinisher;
use nexus_chat::sanitize;

struct PolishedBackend;

#[async_trait]
impl EnhanceBackend for PolishedBackend {
    fn name(&self) -> &'static str {
        "polished"
    }
    async fn load(&self) -> Result<(), EnhanceError> {
        Ok(())
    }
    async fn enhance(&self, _text: &str) -> Result<String, EnhanceError> {
        Ok("It works now.".to_string())
    }
}

async fn settled(loader: &BackendLoader) -> BackendState {
    for _ in 0..200 {
        match loader.state() {
            BackendState::Unloaded | BackendState::Loading => {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            terminal => return terminal,
        }
    }
    loader.state()
}

#[tokio::test]
async fn finish_never_degrades_below_sanitize() {
    let loader = Arc::new(BackendLoader::new(Arc::new(NoBackend)));
    loader.ensure_loaded();
    assert_eq!(settled(&loader).await, BackendState::Failed);

    let finisher = ResponseFinisher::new(loader);
    let raws = [
        "[NEXUS]: it work",
        "[NEXUS]: [positive]hello world  ",
        "already fine.",
        "",
        "   [neutral]   ",
        "no markers at all but  messy   spacing ,  yes ?",
    ];
    for raw in raws {
        assert_eq!(finisher.finish(raw).await, sanitize(raw), "raw = {raw:?}");
    }
}

#[tokio::test]
async fn enhancement_replaces_text_only_when_ready() {
    let loader = Arc::new(BackendLoader::new(Arc::new(PolishedBackend)));
    let finisher = ResponseFinisher::new(loader.clone());

    // Before anything is loaded the sanitized floor answers, and the
    // call itself triggers acquisition.
    assert_eq!(finisher.finish("[NEXUS]: it work").await, "It work.");

    assert_eq!(settled(&loader).await, BackendState::Ready);
    assert_eq!(finisher.finish("[NEXUS]: it work").await, "It works now.");
}

#[tokio::test]
async fn marker_removal_survives_any_repetition() {
    let markers = ["[NEXUS]: ", "[positive]", "[negative]", "[neutral]"];
    for marker in markers {
        for count in 0..6 {
            let raw = format!("{}fine then", marker.repeat(count));
            let clean = sanitize(&raw);
            let lowered = clean.to_lowercase();
            assert!(
                !lowered.contains("[nexus]")
                    && !lowered.contains("[positive]")
                    && !lowered.contains("[negative]")
                    && !lowered.contains("[neutral]"),
                "marker left in {clean:?} (from {raw:?})"
            );
            assert_eq!(clean, "Fine then.");
        }
    }
}

#[tokio::test]
async fn sanitize_is_a_fixpoint_over_pipeline_outputs() {
    let raws = [
        "[NEXUS]: [positive]hello world  ",
        "it work",
        "[[positive]negative]",
        "tabs\tand\nnewlines",
    ];
    for raw in raws {
        let once = sanitize(raw);
        assert_eq!(sanitize(&once), once);
    }
}
