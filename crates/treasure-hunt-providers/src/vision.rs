//! Azure AI Vision Image Analysis 4.0, `read` (OCR) feature.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use treasure_hunt_core::error::PipelineError;

use crate::{Credentials, TextExtractor, http_failure};

pub struct VisionTextExtractor {
    pub endpoint: String,
    api_version: String,
    client: reqwest::Client,
}

impl VisionTextExtractor {
    pub fn new(endpoint: &str, api_version: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/computervision/imageanalysis:analyze?features=read&api-version={}",
            self.endpoint, self.api_version
        )
    }
}

// --- Image Analysis response types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    read_result: Option<ReadResult>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadResult {
    #[serde(default)]
    blocks: Vec<ReadBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadBlock {
    #[serde(default)]
    lines: Vec<ReadLine>,
}

#[derive(Debug, Deserialize)]
struct ReadLine {
    text: String,
}

impl AnalyzeResponse {
    /// All lines of all blocks, in the order the service returned them.
    fn into_lines(self) -> Vec<String> {
        self.read_result
            .unwrap_or_default()
            .blocks
            .into_iter()
            .flat_map(|b| b.lines)
            .map(|l| l.text)
            .collect()
    }
}

#[async_trait]
impl TextExtractor for VisionTextExtractor {
    async fn extract_text(
        &self,
        image: &[u8],
        credentials: &Credentials,
    ) -> Result<Vec<String>, PipelineError> {
        debug!(bytes = image.len(), endpoint = %self.endpoint, "Submitting image for OCR");

        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", credentials.key())
            .header("content-type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| PipelineError::extraction(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::extraction(http_failure(response).await));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::extraction(format!("malformed analysis result: {e}")))?;

        Ok(body.into_lines())
    }
}
