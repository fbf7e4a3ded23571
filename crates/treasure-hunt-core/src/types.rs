use serde::{Deserialize, Serialize};

/// Inbound analyze request: the name of a previously uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(alias = "SelectedImageName", alias = "selectedImageName")]
    pub selected_image_name: String,
}

/// Terminal outcome of one pipeline run, in wire form.
///
/// Serializes to exactly `{"text", "speech"}` or exactly `{"error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineResult {
    Success {
        text: String,
        /// Base64-encoded audio.
        speech: String,
    },
    Failure {
        error: String,
    },
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error } => Some(error),
            Self::Success { .. } => None,
        }
    }
}
