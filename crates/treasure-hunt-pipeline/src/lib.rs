//! Treasure Hunt analysis pipeline.
//!
//! A run takes the name of an uploaded image and walks it through five
//! strictly sequential stages: secret retrieval, image fetch, OCR,
//! interpretation by a chat model, and speech synthesis. Any stage failure
//! ends the run. The typed outcome is rendered to the wire shape only by
//! [`Pipeline::analyze`].

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use treasure_hunt_core::error::Stage;
use treasure_hunt_core::types::PipelineResult;
use treasure_hunt_providers::{
    Interpreter, ObjectStore, SecretProvider, SpeechSynthesizer, TextExtractor,
};

pub mod runtime;
pub mod settings;

pub use runtime::Pipeline;
pub use settings::PipelineSettings;

/// The external services a pipeline run talks to.
///
/// Built once at startup and shared read-only by every run.
#[derive(Clone)]
pub struct Services {
    pub secrets: Arc<dyn SecretProvider>,
    pub store: Arc<dyn ObjectStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub interpreter: Arc<dyn Interpreter>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

/// Successful run: the model's answer and the synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
    pub speech: Vec<u8>,
}

impl Analysis {
    /// Wire form, with the audio base64-encoded.
    pub fn into_result(self) -> PipelineResult {
        PipelineResult::Success {
            speech: base64::engine::general_purpose::STANDARD.encode(&self.speech),
            text: self.text,
        }
    }
}

/// Receives the timing of every finished stage.
pub trait StageObserver: Send + Sync {
    fn stage_finished(&self, stage: Stage, elapsed: Duration, succeeded: bool);
}
