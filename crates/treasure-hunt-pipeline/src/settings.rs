//! Fixed per-deployment pipeline parameters.

use serde::{Deserialize, Serialize};

use treasure_hunt_core::config::Config;
use treasure_hunt_providers::{InterpretRequest, Voice};

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant that reveals the secret from the message.";

/// Prepended to the extracted text in the user message.
pub const ANALYSIS_PREFIX: &str = "Analyze the following text and discover the hidden info:\n";

/// Everything a run needs besides the services themselves.
///
/// None of this varies per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub openai_key_secret: String,
    pub cognitive_key_secret: String,
    pub system_instruction: String,
    pub analysis_prefix: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub voice: Voice,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_parts(&Config::default(), "eastus")
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let region = config
            .speech_region()
            .ok_or_else(|| anyhow::anyhow!("speech.region not configured (COGNITIVE_REGION)"))?;
        Ok(Self::from_parts(config, region))
    }

    fn from_parts(config: &Config, region: &str) -> Self {
        Self {
            openai_key_secret: config.openai_key_secret().to_string(),
            cognitive_key_secret: config.cognitive_key_secret().to_string(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            analysis_prefix: ANALYSIS_PREFIX.to_string(),
            max_tokens: config.openai_max_tokens(),
            temperature: config.openai_temperature(),
            voice: Voice {
                name: config.speech_voice().to_string(),
                region: region.to_string(),
            },
        }
    }

    /// Chat request for the given extracted text.
    pub fn interpret_request(&self, extracted: &str) -> InterpretRequest {
        InterpretRequest {
            system_instruction: self.system_instruction.clone(),
            user_text: format!("{}{}", self.analysis_prefix, extracted),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}
