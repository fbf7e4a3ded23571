//! Pipeline runtime: the stage chain and its boundary rendering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use treasure_hunt_core::config::Config;
use treasure_hunt_core::error::{PipelineError, Stage};
use treasure_hunt_core::types::PipelineResult;
use treasure_hunt_providers::{
    AzureOpenAiInterpreter, AzureSpeechSynthesizer, BlobStore, CachedSecretProvider, Credentials,
    KeyVaultSecrets, ObjectStore, TokenCredential, VisionTextExtractor,
};

use crate::{Analysis, PipelineSettings, Services, StageObserver};

/// API keys for one run. Dropped when the run ends.
struct RunKeys {
    openai: Credentials,
    cognitive: Credentials,
}

pub struct Pipeline {
    services: Services,
    settings: PipelineSettings,
    observer: Option<Arc<dyn StageObserver>>,
}

fn required(value: Option<&str>, what: &str) -> anyhow::Result<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("{what} not configured"))
}

impl Pipeline {
    pub fn new(services: Services, settings: PipelineSettings) -> Self {
        Self {
            services,
            settings,
            observer: None,
        }
    }

    /// Wire the Azure adapters from config around a shared credential.
    pub fn from_config(
        config: &Config,
        credential: Arc<dyn TokenCredential>,
    ) -> anyhow::Result<Self> {
        let vault_url = required(config.vault_url(), "key_vault.url (AKV_URL)")?;
        let storage_url = required(config.storage_url(), "storage.url (STORAGE_URL)")?;
        let container = required(
            config.storage_container(),
            "storage.container (STORAGE_CONTAINER)",
        )?;
        let vision_endpoint = required(config.vision_endpoint(), "vision.endpoint (COGNITIVE_URL)")?;
        let openai_endpoint = required(config.openai_endpoint(), "openai.endpoint (AOAI_URL)")?;
        let deployment = required(
            config.openai_deployment(),
            "openai.deployment (AOAI_DEPLOYMENT)",
        )?;

        let vault = Arc::new(KeyVaultSecrets::new(&vault_url, credential.clone()));
        let ttl = Duration::from_secs(config.secret_cache_ttl_secs());

        let services = Services {
            secrets: Arc::new(CachedSecretProvider::new(vault, ttl)),
            store: Arc::new(BlobStore::new(&storage_url, &container, credential)),
            extractor: Arc::new(VisionTextExtractor::new(
                &vision_endpoint,
                config.vision_api_version(),
            )),
            interpreter: Arc::new(AzureOpenAiInterpreter::new(
                &openai_endpoint,
                &deployment,
                config.openai_api_version(),
            )),
            synthesizer: Arc::new(AzureSpeechSynthesizer::new(
                config.speech_output_format(),
                config.speech_endpoint(),
            )),
        };

        info!(
            container = %container,
            deployment = %deployment,
            voice = %config.speech_voice(),
            secret_cache_ttl_secs = ttl.as_secs(),
            "Pipeline services configured"
        );

        Ok(Self::new(services, PipelineSettings::from_config(config)?))
    }

    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The image store, shared with listing and display.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.services.store
    }

    /// Run every stage and return the wire result. Never fails.
    pub async fn analyze(&self, image_name: &str) -> PipelineResult {
        match self.run(image_name).await {
            Ok(analysis) => analysis.into_result(),
            Err(e) => PipelineResult::Failure { error: e.render() },
        }
    }

    /// Run every stage, stopping at the first failure.
    pub async fn run(&self, image_name: &str) -> Result<Analysis, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id, image = image_name);
        self.run_stages(image_name).instrument(span).await
    }

    async fn run_stages(&self, image_name: &str) -> Result<Analysis, PipelineError> {
        let started = Instant::now();

        let keys = self
            .timed(Stage::RetrieveSecrets, self.retrieve_secrets())
            .await?;
        let image = self
            .timed(Stage::FetchImage, self.services.store.get_object(image_name))
            .await?;
        let lines = self
            .timed(
                Stage::ExtractText,
                self.services.extractor.extract_text(&image, &keys.cognitive),
            )
            .await?;
        drop(image);
        let text = self
            .timed(Stage::Interpret, self.interpret(&lines, &keys.openai))
            .await?;
        let speech = self
            .timed(Stage::Synthesize, self.synthesize(&text, &keys.cognitive))
            .await?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            text_len = text.len(),
            audio_bytes = speech.len(),
            "Pipeline run completed"
        );
        Ok(Analysis { text, speech })
    }

    async fn retrieve_secrets(&self) -> Result<RunKeys, PipelineError> {
        let secrets = &self.services.secrets;
        let openai = secrets.get_secret(&self.settings.openai_key_secret).await?;
        let cognitive = secrets.get_secret(&self.settings.cognitive_key_secret).await?;
        Ok(RunKeys {
            openai: Credentials::api_key(openai),
            cognitive: Credentials::api_key(cognitive),
        })
    }

    async fn interpret(
        &self,
        lines: &[String],
        credentials: &Credentials,
    ) -> Result<String, PipelineError> {
        let extracted = lines.join(" ");
        if extracted.is_empty() {
            warn!("No text recognized in image; interpreting an empty payload");
        }
        let request = self.settings.interpret_request(&extracted);
        self.services.interpreter.interpret(&request, credentials).await
    }

    async fn synthesize(
        &self,
        text: &str,
        credentials: &Credentials,
    ) -> Result<Vec<u8>, PipelineError> {
        self.services
            .synthesizer
            .synthesize(text, credentials, &self.settings.voice)
            .await
            .into_audio()
    }

    async fn timed<T>(
        &self,
        stage: Stage,
        step: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        let started = Instant::now();
        debug!(%stage, "Stage started");

        let result = step.instrument(info_span!("stage", %stage)).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => info!(%stage, elapsed_ms = elapsed.as_millis() as u64, "Stage finished"),
            Err(e) => warn!(
                %stage,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                detail = e.detail(),
                "Stage failed"
            ),
        }
        if let Some(observer) = &self.observer {
            observer.stage_finished(stage, elapsed, result.is_ok());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::Engine;

    use treasure_hunt_providers::{
        CancellationReason, InterpretRequest, Interpreter, SecretProvider, SpeechSynthesizer,
        SynthesisOutcome, TextExtractor, Voice,
    };

    use crate::settings::ANALYSIS_PREFIX;

    #[derive(Default)]
    struct CallLog(Mutex<Vec<String>>);

    impl CallLog {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }

        fn snapshot(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        fn contains_prefix(&self, prefix: &str) -> bool {
            self.snapshot().iter().any(|c| c.starts_with(prefix))
        }
    }

    struct FakeSecrets {
        log: Arc<CallLog>,
        missing: Option<&'static str>,
    }

    #[async_trait]
    impl SecretProvider for FakeSecrets {
        async fn get_secret(&self, name: &str) -> Result<String, PipelineError> {
            self.log.push(format!("secret:{name}"));
            if self.missing == Some(name) {
                return Err(PipelineError::secret_not_found(name, "HTTP 404 Not Found"));
            }
            Ok(format!("{name}-value"))
        }
    }

    struct FakeStore {
        log: Arc<CallLog>,
        objects: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn get_object(&self, name: &str) -> Result<Vec<u8>, PipelineError> {
            self.log.push(format!("fetch:{name}"));
            self.objects.get(name).cloned().ok_or_else(|| {
                PipelineError::object_not_found(name, "HTTP 404 Not Found: BlobNotFound")
            })
        }

        async fn list_objects(&self) -> anyhow::Result<Vec<String>> {
            let mut names: Vec<String> = self.objects.keys().cloned().collect();
            names.sort();
            Ok(names)
        }
    }

    /// Reads "lines" out of the image bytes, split on '|', unless fixed.
    struct FakeExtractor {
        log: Arc<CallLog>,
        fixed: Option<Vec<String>>,
        failure: Option<&'static str>,
    }

    #[async_trait]
    impl TextExtractor for FakeExtractor {
        async fn extract_text(
            &self,
            image: &[u8],
            credentials: &Credentials,
        ) -> Result<Vec<String>, PipelineError> {
            self.log.push(format!("extract:{}", credentials.key()));
            tokio::task::yield_now().await;
            if let Some(detail) = self.failure {
                return Err(PipelineError::extraction(detail));
            }
            if let Some(lines) = &self.fixed {
                return Ok(lines.clone());
            }
            Ok(String::from_utf8_lossy(image)
                .split('|')
                .map(str::to_string)
                .collect())
        }
    }

    struct FakeInterpreter {
        log: Arc<CallLog>,
        requests: Mutex<Vec<InterpretRequest>>,
        failure: Option<&'static str>,
    }

    #[async_trait]
    impl Interpreter for FakeInterpreter {
        async fn interpret(
            &self,
            request: &InterpretRequest,
            credentials: &Credentials,
        ) -> Result<String, PipelineError> {
            self.log.push(format!("interpret:{}", credentials.key()));
            self.requests.lock().unwrap().push(request.clone());
            if let Some(detail) = self.failure {
                return Err(PipelineError::interpretation(detail));
            }
            let extracted = request
                .user_text
                .strip_prefix(ANALYSIS_PREFIX)
                .unwrap_or(&request.user_text);
            Ok(format!("The answer hides in: {extracted}"))
        }
    }

    struct FakeSynthesizer {
        log: Arc<CallLog>,
        canceled: Option<SynthesisOutcome>,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            credentials: &Credentials,
            voice: &Voice,
        ) -> SynthesisOutcome {
            self.log
                .push(format!("synthesize:{}:{}", credentials.key(), voice.name));
            match &self.canceled {
                Some(outcome) => outcome.clone(),
                None => SynthesisOutcome::Completed {
                    audio: [b"RIFF".as_slice(), text.as_bytes()].concat(),
                },
            }
        }
    }

    struct Harness {
        log: Arc<CallLog>,
        interpreter: Arc<FakeInterpreter>,
        pipeline: Pipeline,
    }

    #[derive(Default)]
    struct Setup {
        fixed_lines: Option<Vec<String>>,
        canceled: Option<SynthesisOutcome>,
        missing_secret: Option<&'static str>,
        extraction_failure: Option<&'static str>,
        interpretation_failure: Option<&'static str>,
    }

    fn harness(setup: Setup) -> Harness {
        let log = Arc::new(CallLog::default());
        let objects = HashMap::from([
            ("clue1.png".to_string(), b"Meet me|under the old oak".to_vec()),
            ("clue2.png".to_string(), b"The code|is 4242".to_vec()),
        ]);
        let interpreter = Arc::new(FakeInterpreter {
            log: log.clone(),
            requests: Mutex::new(Vec::new()),
            failure: setup.interpretation_failure,
        });
        let services = Services {
            secrets: Arc::new(FakeSecrets {
                log: log.clone(),
                missing: setup.missing_secret,
            }),
            store: Arc::new(FakeStore {
                log: log.clone(),
                objects,
            }),
            extractor: Arc::new(FakeExtractor {
                log: log.clone(),
                fixed: setup.fixed_lines,
                failure: setup.extraction_failure,
            }),
            interpreter: interpreter.clone(),
            synthesizer: Arc::new(FakeSynthesizer {
                log: log.clone(),
                canceled: setup.canceled,
            }),
        };
        Harness {
            log,
            interpreter,
            pipeline: Pipeline::new(services, PipelineSettings::default()),
        }
    }

    fn json_keys(result: &PipelineResult) -> Vec<String> {
        let value = serde_json::to_value(result).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_successful_run_returns_text_and_speech() {
        let h = harness(Setup::default());
        let result = h.pipeline.analyze("clue1.png").await;

        let PipelineResult::Success { text, speech } = &result else {
            panic!("expected success, got {result:?}");
        };
        assert_eq!(text, "The answer hides in: Meet me under the old oak");
        let audio = base64::engine::general_purpose::STANDARD
            .decode(speech)
            .unwrap();
        assert!(audio.starts_with(b"RIFF"));
        assert_eq!(json_keys(&result), vec!["speech", "text"]);
    }

    #[tokio::test]
    async fn test_stages_run_in_order_with_the_right_keys() {
        let h = harness(Setup::default());
        h.pipeline.analyze("clue1.png").await;
        assert_eq!(
            h.log.snapshot(),
            vec![
                "secret:AOAI-KEY",
                "secret:COGNITIVE-KEY",
                "fetch:clue1.png",
                "extract:COGNITIVE-KEY-value",
                "interpret:AOAI-KEY-value",
                "synthesize:COGNITIVE-KEY-value:en-US-AvaNeural",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_object_fails_fast() {
        let h = harness(Setup::default());
        let result = h.pipeline.analyze("nope.png").await;

        let error = result.error().expect("error result");
        assert!(error.starts_with("Object not found: nope.png\n"), "{error}");
        assert!(error.contains("fetch_image"));
        assert!(error.contains("BlobNotFound"));
        assert_eq!(json_keys(&result), vec!["error"]);
        assert!(!h.log.contains_prefix("extract"));
        assert!(!h.log.contains_prefix("interpret"));
        assert!(!h.log.contains_prefix("synthesize"));
    }

    #[tokio::test]
    async fn test_missing_secret_stops_before_fetch() {
        let h = harness(Setup {
            missing_secret: Some("AOAI-KEY"),
            ..Default::default()
        });
        let result = h.pipeline.analyze("clue1.png").await;
        assert!(result.error().unwrap().starts_with("Secret not found: AOAI-KEY"));
        assert_eq!(h.log.snapshot(), vec!["secret:AOAI-KEY"]);
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_interpretation_and_speech() {
        let h = harness(Setup {
            extraction_failure: Some("HTTP 401 Unauthorized: invalid subscription key"),
            ..Default::default()
        });
        let result = h.pipeline.analyze("clue1.png").await;

        let error = result.error().expect("error result");
        assert!(error.starts_with("Text extraction failed\n"), "{error}");
        assert!(error.contains("extract_text"));
        assert!(error.contains("invalid subscription key"));
        assert_eq!(json_keys(&result), vec!["error"]);
        assert!(h.log.contains_prefix("extract"));
        assert!(!h.log.contains_prefix("interpret"));
        assert!(!h.log.contains_prefix("synthesize"));
    }

    #[tokio::test]
    async fn test_interpretation_failure_skips_speech() {
        let h = harness(Setup {
            interpretation_failure: Some("HTTP 429 Too Many Requests: rate limited"),
            ..Default::default()
        });
        let result = h.pipeline.analyze("clue1.png").await;

        let error = result.error().expect("error result");
        assert!(error.starts_with("Interpretation failed\n"), "{error}");
        assert!(error.contains("rate limited"));
        assert_eq!(json_keys(&result), vec!["error"]);
        assert!(h.log.contains_prefix("interpret"));
        assert!(!h.log.contains_prefix("synthesize"));

        let err = h.pipeline.run("clue1.png").await.unwrap_err();
        assert_eq!(err.stage(), Stage::Interpret);
    }

    #[tokio::test]
    async fn test_zero_lines_still_interprets_empty_payload() {
        let h = harness(Setup {
            fixed_lines: Some(Vec::new()),
            ..Default::default()
        });
        let result = h.pipeline.analyze("clue1.png").await;
        assert!(result.is_success());

        let requests = h.interpreter.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_text, ANALYSIS_PREFIX);
    }

    #[tokio::test]
    async fn test_canceled_synthesis_reports_reason() {
        let h = harness(Setup {
            canceled: Some(SynthesisOutcome::Canceled {
                reason: CancellationReason::Error,
                error_details: "HTTP 401 Unauthorized: bad key".into(),
            }),
            ..Default::default()
        });
        let result = h.pipeline.analyze("clue1.png").await;

        let error = result.error().expect("error result");
        assert!(error.starts_with("Speech synthesis failed: Canceled (Error)"));
        assert!(error.contains("401"));
        assert_eq!(json_keys(&result), vec!["error"]);
    }

    #[tokio::test]
    async fn test_run_keeps_failing_stage() {
        let h = harness(Setup::default());
        let err = h.pipeline.run("nope.png").await.unwrap_err();
        assert_eq!(err.stage(), Stage::FetchImage);
    }

    #[tokio::test]
    async fn test_same_input_gives_identical_json() {
        let h = harness(Setup::default());
        let first = serde_json::to_string(&h.pipeline.analyze("clue2.png").await).unwrap();
        let second = serde_json::to_string(&h.pipeline.analyze("clue2.png").await).unwrap();
        assert_eq!(first, second);

        let h = harness(Setup::default());
        let first = serde_json::to_string(&h.pipeline.analyze("gone.png").await).unwrap();
        let second = serde_json::to_string(&h.pipeline.analyze("gone.png").await).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_not_share_text() {
        let h = harness(Setup::default());
        let (a, b) = tokio::join!(
            h.pipeline.analyze("clue1.png"),
            h.pipeline.analyze("clue2.png")
        );

        assert_eq!(
            a,
            h.pipeline.analyze("clue1.png").await,
            "interleaved run differs from a solo run"
        );
        assert!(matches!(&b, PipelineResult::Success { text, .. } if text.ends_with("The code is 4242")));

        let requests = h.interpreter.requests.lock().unwrap();
        let mut texts: Vec<&str> = requests.iter().map(|r| r.user_text.as_str()).collect();
        texts.sort();
        texts.dedup();
        assert_eq!(
            texts,
            vec![
                format!("{ANALYSIS_PREFIX}Meet me under the old oak"),
                format!("{ANALYSIS_PREFIX}The code is 4242"),
            ]
        );
    }

    #[derive(Default)]
    struct RecordingObserver(Mutex<Vec<(Stage, bool)>>);

    impl StageObserver for RecordingObserver {
        fn stage_finished(&self, stage: Stage, _elapsed: Duration, succeeded: bool) {
            self.0.lock().unwrap().push((stage, succeeded));
        }
    }

    #[tokio::test]
    async fn test_observer_sees_every_finished_stage() {
        let observer = Arc::new(RecordingObserver::default());
        let h = harness(Setup::default());
        let pipeline = h.pipeline.with_observer(observer.clone());

        pipeline.analyze("clue1.png").await;
        let seen: Vec<(Stage, bool)> = observer.0.lock().unwrap().drain(..).collect();
        assert_eq!(seen, Stage::ALL.iter().map(|s| (*s, true)).collect::<Vec<_>>());

        pipeline.analyze("nope.png").await;
        let seen: Vec<(Stage, bool)> = observer.0.lock().unwrap().drain(..).collect();
        assert_eq!(
            seen,
            vec![(Stage::RetrieveSecrets, true), (Stage::FetchImage, false)]
        );
    }
}
