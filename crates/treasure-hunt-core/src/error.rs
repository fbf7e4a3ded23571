use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HuntError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HuntError>;

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RetrieveSecrets,
    FetchImage,
    ExtractText,
    Interpret,
    Synthesize,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::RetrieveSecrets,
        Stage::FetchImage,
        Stage::ExtractText,
        Stage::Interpret,
        Stage::Synthesize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RetrieveSecrets => "retrieve_secrets",
            Stage::FetchImage => "fetch_image",
            Stage::ExtractText => "extract_text",
            Stage::Interpret => "interpret",
            Stage::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single pipeline stage.
///
/// Every variant belongs to exactly one [`Stage`]. Adapters translate
/// transport, auth, and decoding failures into the variant of the stage
/// they serve, carrying the upstream cause verbatim in `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Secret not found: {name}")]
    SecretNotFound { name: String, detail: String },

    #[error("Object not found: {name}")]
    ObjectNotFound { name: String, detail: String },

    #[error("Text extraction failed")]
    ExtractionFailed { detail: String },

    #[error("Interpretation failed")]
    InterpretationFailed { detail: String },

    #[error("Speech synthesis failed: {reason}")]
    SynthesisFailed { reason: String, detail: String },
}

impl PipelineError {
    pub fn secret_not_found(name: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::SecretNotFound {
            name: name.into(),
            detail: detail.to_string(),
        }
    }

    pub fn object_not_found(name: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::ObjectNotFound {
            name: name.into(),
            detail: detail.to_string(),
        }
    }

    pub fn extraction(detail: impl fmt::Display) -> Self {
        Self::ExtractionFailed {
            detail: detail.to_string(),
        }
    }

    pub fn interpretation(detail: impl fmt::Display) -> Self {
        Self::InterpretationFailed {
            detail: detail.to_string(),
        }
    }

    pub fn synthesis(reason: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::SynthesisFailed {
            reason: reason.into(),
            detail: detail.to_string(),
        }
    }

    /// The stage this failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::SecretNotFound { .. } => Stage::RetrieveSecrets,
            Self::ObjectNotFound { .. } => Stage::FetchImage,
            Self::ExtractionFailed { .. } => Stage::ExtractText,
            Self::InterpretationFailed { .. } => Stage::Interpret,
            Self::SynthesisFailed { .. } => Stage::Synthesize,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::SecretNotFound { detail, .. }
            | Self::ObjectNotFound { detail, .. }
            | Self::ExtractionFailed { detail }
            | Self::InterpretationFailed { detail }
            | Self::SynthesisFailed { detail, .. } => detail,
        }
    }

    /// Wire form of the failure: `"<message>\n<diagnostic>"`.
    pub fn render(&self) -> String {
        format!("{self}\nat stage {}: {}", self.stage(), self.detail())
    }
}
