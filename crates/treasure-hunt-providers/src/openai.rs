//! Azure OpenAI Chat Completions provider.
//!
//! Non-streaming `/openai/deployments/{deployment}/chat/completions` call
//! with exactly two messages (system + user). The first returned choice
//! is the answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use treasure_hunt_core::error::PipelineError;

use crate::{Credentials, InterpretRequest, Interpreter, http_failure};

pub struct AzureOpenAiInterpreter {
    pub endpoint: String,
    pub deployment: String,
    api_version: String,
    client: reqwest::Client,
}

impl AzureOpenAiInterpreter {
    pub fn new(endpoint: &str, deployment: &str, api_version: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment: deployment.to_string(),
            api_version: api_version.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

// --- Chat Completions request/response types ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request(request: &InterpretRequest) -> ChatRequest<'_> {
    ChatRequest {
        messages: [
            ChatMessage {
                role: "system",
                content: &request.system_instruction,
            },
            ChatMessage {
                role: "user",
                content: &request.user_text,
            },
        ],
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

fn first_answer(completion: ChatCompletion) -> Result<String, PipelineError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::interpretation("completion returned no choices"))?;

    if choice.finish_reason.as_deref() == Some("length") {
        warn!("Completion hit the max_tokens limit; answer may be truncated");
    }

    choice
        .message
        .content
        .ok_or_else(|| PipelineError::interpretation("first choice has no content"))
}

#[async_trait]
impl Interpreter for AzureOpenAiInterpreter {
    async fn interpret(
        &self,
        request: &InterpretRequest,
        credentials: &Credentials,
    ) -> Result<String, PipelineError> {
        let body = build_request(request);

        debug!(
            deployment = %self.deployment,
            max_tokens = body.max_tokens,
            temperature = body.temperature,
            user_len = request.user_text.len(),
            "Calling Azure OpenAI chat completions"
        );

        let response = self
            .client
            .post(self.chat_url())
            .header("api-key", credentials.key())
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::interpretation(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            // Quota and auth errors are passed through untouched.
            return Err(PipelineError::interpretation(http_failure(response).await));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| PipelineError::interpretation(format!("malformed completion: {e}")))?;

        first_answer(completion)
    }
}
