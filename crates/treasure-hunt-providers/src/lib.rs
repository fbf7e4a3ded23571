//! Service capabilities used by the analysis pipeline.
//!
//! Each external collaborator (secret store, object store, OCR, chat model,
//! speech synthesis) is a trait so the pipeline can run against fakes in
//! tests. The Azure REST adapters in the submodules are the production
//! implementations.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use treasure_hunt_core::error::PipelineError;

pub mod auth;
pub mod blob;
pub mod cache;
pub mod keyvault;
pub mod openai;
pub mod speech;
pub mod vision;

pub use auth::{ClientSecretCredential, TokenCredential};
pub use blob::BlobStore;
pub use cache::CachedSecretProvider;
pub use keyvault::KeyVaultSecrets;
pub use openai::AzureOpenAiInterpreter;
pub use speech::AzureSpeechSynthesizer;
pub use vision::VisionTextExtractor;

/// API key for a cognitive backend, as fetched from the secret store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .finish()
    }
}

/// A chat-completion request: one system instruction and one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub system_instruction: String,
    pub user_text: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Voice identity used for synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub region: String,
}

/// Why a synthesis call ended without audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationReason {
    /// The backend (or the transport to it) reported an error.
    Error,
    /// The backend answered successfully but returned no audio.
    NoAudio,
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationReason::Error => f.write_str("Error"),
            CancellationReason::NoAudio => f.write_str("NoAudio"),
        }
    }
}

/// Terminal state of a synthesis call. Only `Completed` carries audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Completed { audio: Vec<u8> },
    Canceled {
        reason: CancellationReason,
        error_details: String,
    },
}

impl SynthesisOutcome {
    /// Audio bytes for a completed synthesis, `SynthesisFailed` otherwise.
    pub fn into_audio(self) -> Result<Vec<u8>, PipelineError> {
        match self {
            SynthesisOutcome::Completed { audio } => Ok(audio),
            SynthesisOutcome::Canceled {
                reason,
                error_details,
            } => Err(PipelineError::synthesis(
                format!("Canceled ({reason})"),
                error_details,
            )),
        }
    }
}

/// Fetches named credentials from a secret store.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fails with `SecretNotFound` when the name is unknown or access is denied.
    async fn get_secret(&self, name: &str) -> Result<String, PipelineError>;
}

/// Named binary objects in a storage container.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Full object content. Fails with `ObjectNotFound` when missing.
    async fn get_object(&self, name: &str) -> Result<Vec<u8>, PipelineError>;

    /// Names of all objects in the container.
    async fn list_objects(&self) -> anyhow::Result<Vec<String>>;
}

/// OCR over raw image bytes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Recognized lines in backend reading order. Zero lines is not an error.
    async fn extract_text(
        &self,
        image: &[u8],
        credentials: &Credentials,
    ) -> Result<Vec<String>, PipelineError>;
}

/// Hosted chat-completion model.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(
        &self,
        request: &InterpretRequest,
        credentials: &Credentials,
    ) -> Result<String, PipelineError>;
}

/// Text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// One synchronous synthesis call. Transport failures surface as `Canceled`.
    async fn synthesize(
        &self,
        text: &str,
        credentials: &Credentials,
        voice: &Voice,
    ) -> SynthesisOutcome;
}

/// Build `base` with `segments` appended as percent-encoded path segments.
pub(crate) fn url_with_segments<'a>(
    base: &str,
    segments: impl IntoIterator<Item = &'a str>,
) -> anyhow::Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("URL cannot be a base: {base}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Read a non-success response into a `HTTP <status>: <body>` diagnostic.
pub(crate) async fn http_failure(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("HTTP {status}: {body}")
}
