//! Azure Speech text-to-speech over the REST endpoint.
//!
//! One SSML request per call. The HTTP outcome is mapped onto the two
//! terminal states of [`SynthesisOutcome`].

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{CancellationReason, Credentials, SpeechSynthesizer, SynthesisOutcome, Voice, http_failure};

pub struct AzureSpeechSynthesizer {
    output_format: String,
    endpoint_override: Option<String>,
    client: reqwest::Client,
}

impl AzureSpeechSynthesizer {
    pub fn new(output_format: &str, endpoint_override: Option<&str>) -> Self {
        Self {
            output_format: output_format.to_string(),
            endpoint_override: endpoint_override.map(|e| e.trim_end_matches('/').to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// Regional TTS endpoint, unless overridden.
    pub fn endpoint(&self, region: &str) -> String {
        match &self.endpoint_override {
            Some(e) => format!("{e}/cognitiveservices/v1"),
            None => format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1"),
        }
    }

    async fn request(
        &self,
        text: &str,
        credentials: &Credentials,
        voice: &Voice,
    ) -> Result<Vec<u8>, (CancellationReason, String)> {
        let response = self
            .client
            .post(self.endpoint(&voice.region))
            .header("Ocp-Apim-Subscription-Key", credentials.key())
            .header("content-type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .header("user-agent", concat!("treasure-hunt/", env!("CARGO_PKG_VERSION")))
            .body(build_ssml(text, &voice.name))
            .send()
            .await
            .map_err(|e| (CancellationReason::Error, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err((CancellationReason::Error, http_failure(response).await));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| (CancellationReason::Error, format!("reading audio failed: {e}")))?;

        if audio.is_empty() {
            return Err((
                CancellationReason::NoAudio,
                "service returned an empty audio stream".to_string(),
            ));
        }
        Ok(audio.to_vec())
    }
}

/// `en-US-AvaNeural` -> `en-US`.
fn voice_locale(voice: &str) -> &str {
    let mut parts = voice.splitn(3, '-');
    match (parts.next(), parts.next()) {
        (Some(lang), Some(region)) if !lang.is_empty() && !region.is_empty() => {
            &voice[..lang.len() + 1 + region.len()]
        }
        _ => "en-US",
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SSML document speaking `text` with `voice`.
pub fn build_ssml(text: &str, voice: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{lang}'><voice name='{voice}'>{text}</voice></speak>",
        lang = voice_locale(voice),
        voice = escape_xml(voice),
        text = escape_xml(text),
    )
}

#[async_trait]
impl SpeechSynthesizer for AzureSpeechSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        credentials: &Credentials,
        voice: &Voice,
    ) -> SynthesisOutcome {
        debug!(voice = %voice.name, region = %voice.region, text_len = text.len(), "Synthesizing speech");

        match self.request(text, credentials, voice).await {
            Ok(audio) => {
                info!(bytes = audio.len(), voice = %voice.name, "Speech synthesis completed");
                SynthesisOutcome::Completed { audio }
            }
            Err((reason, error_details)) => {
                warn!(%reason, %error_details, "Speech synthesis canceled");
                SynthesisOutcome::Canceled {
                    reason,
                    error_details,
                }
            }
        }
    }
}
