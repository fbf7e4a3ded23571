//! Configuration loading, environment overlay, and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_AOAI_SECRET: &str = "AOAI-KEY";
const DEFAULT_COGNITIVE_SECRET: &str = "COGNITIVE-KEY";
const DEFAULT_VISION_API_VERSION: &str = "2024-02-01";
const DEFAULT_OPENAI_API_VERSION: &str = "2024-02-01";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_VOICE: &str = "en-US-AvaNeural";
const DEFAULT_OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";
const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const DEFAULT_HUNTER_NAME: &str = "Hunter X";
const REDACTED: &str = "***";

/// Top-level Treasure Hunt configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_vault: Option<KeyVaultConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Service principal used to reach Key Vault and Blob Storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret_env: Option<String>,

    /// Token authority (default: `https://login.microsoftonline.com`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority_host: Option<String>,
}

impl AzureConfig {
    pub fn resolve_client_secret(&self) -> Option<String> {
        resolve_secret_field(&self.client_secret, &self.client_secret_env)
    }

    pub fn authority_host(&self) -> &str {
        self.authority_host
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITY_HOST)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyVaultConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Secret holding the Azure OpenAI key (default: `AOAI-KEY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_key_secret: Option<String>,

    /// Secret holding the vision/speech key (default: `COGNITIVE-KEY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_key_secret: Option<String>,

    /// Seconds a fetched secret may be reused. 0 (default) fetches fresh on every run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Blob service account URL, e.g. `https://acct.blob.core.windows.net`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Neural voice name (default: `en-US-AvaNeural`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// `X-Microsoft-OutputFormat` value (default: `riff-24khz-16bit-mono-pcm`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    /// Overrides the regional TTS endpoint derived from `region`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunter_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "treasure_hunt_pipeline=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

/// Fill `slot` from `lookup(var)` when it is unset or empty.
fn fill(slot: &mut Option<String>, var: &str, lookup: &impl Fn(&str) -> Option<String>) {
    if slot.as_deref().is_none_or(str::is_empty) {
        if let Some(val) = lookup(var).filter(|v| !v.is_empty()) {
            *slot = Some(val);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::HuntError::Io)?;

        // Substitute ${ENV_VAR} references before parsing
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::HuntError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Load the file, then fill unset fields from the process environment.
    pub fn load_with_env(path: &Path) -> crate::error::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|var| std::env::var(var).ok());
        Ok(config)
    }

    /// Fill unset fields from the deployment variables (`AOAI_URL`, `AKV_URL`, ...).
    ///
    /// Values already present in the file are never overwritten.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let azure = self.azure.get_or_insert_with(AzureConfig::default);
        fill(&mut azure.tenant_id, "SP_TENANT_ID", &lookup);
        fill(&mut azure.client_id, "SP_CLIENT_ID", &lookup);
        if azure.resolve_client_secret().is_none() {
            fill(&mut azure.client_secret, "SP_CLIENT_SECRET", &lookup);
        }

        let vault = self.key_vault.get_or_insert_with(KeyVaultConfig::default);
        fill(&mut vault.url, "AKV_URL", &lookup);

        let storage = self.storage.get_or_insert_with(StorageConfig::default);
        fill(&mut storage.url, "STORAGE_URL", &lookup);
        fill(&mut storage.container, "STORAGE_CONTAINER", &lookup);

        let vision = self.vision.get_or_insert_with(VisionConfig::default);
        fill(&mut vision.endpoint, "COGNITIVE_URL", &lookup);

        let openai = self.openai.get_or_insert_with(OpenAiConfig::default);
        fill(&mut openai.endpoint, "AOAI_URL", &lookup);
        fill(&mut openai.deployment, "AOAI_DEPLOYMENT", &lookup);

        let speech = self.speech.get_or_insert_with(SpeechConfig::default);
        fill(&mut speech.region, "COGNITIVE_REGION", &lookup);
    }

    /// Resolve the config file path.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Gateway port.
    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(8080)
    }

    /// Gateway bind address.
    pub fn gateway_bind(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn vault_url(&self) -> Option<&str> {
        self.key_vault.as_ref().and_then(|k| non_empty(&k.url))
    }

    /// Name of the Key Vault secret holding the Azure OpenAI key.
    pub fn openai_key_secret(&self) -> &str {
        self.key_vault
            .as_ref()
            .and_then(|k| non_empty(&k.openai_key_secret))
            .unwrap_or(DEFAULT_AOAI_SECRET)
    }

    /// Name of the Key Vault secret holding the vision/speech key.
    pub fn cognitive_key_secret(&self) -> &str {
        self.key_vault
            .as_ref()
            .and_then(|k| non_empty(&k.cognitive_key_secret))
            .unwrap_or(DEFAULT_COGNITIVE_SECRET)
    }

    /// Secret cache TTL in seconds (0 = no caching).
    pub fn secret_cache_ttl_secs(&self) -> u64 {
        self.key_vault
            .as_ref()
            .and_then(|k| k.cache_ttl_secs)
            .unwrap_or(0)
    }

    pub fn storage_url(&self) -> Option<&str> {
        self.storage.as_ref().and_then(|s| non_empty(&s.url))
    }

    pub fn storage_container(&self) -> Option<&str> {
        self.storage.as_ref().and_then(|s| non_empty(&s.container))
    }

    pub fn vision_endpoint(&self) -> Option<&str> {
        self.vision.as_ref().and_then(|v| non_empty(&v.endpoint))
    }

    pub fn vision_api_version(&self) -> &str {
        self.vision
            .as_ref()
            .and_then(|v| non_empty(&v.api_version))
            .unwrap_or(DEFAULT_VISION_API_VERSION)
    }

    pub fn openai_endpoint(&self) -> Option<&str> {
        self.openai.as_ref().and_then(|o| non_empty(&o.endpoint))
    }

    pub fn openai_deployment(&self) -> Option<&str> {
        self.openai.as_ref().and_then(|o| non_empty(&o.deployment))
    }

    pub fn openai_api_version(&self) -> &str {
        self.openai
            .as_ref()
            .and_then(|o| non_empty(&o.api_version))
            .unwrap_or(DEFAULT_OPENAI_API_VERSION)
    }

    pub fn openai_max_tokens(&self) -> u32 {
        self.openai
            .as_ref()
            .and_then(|o| o.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn openai_temperature(&self) -> f64 {
        self.openai
            .as_ref()
            .and_then(|o| o.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn speech_region(&self) -> Option<&str> {
        self.speech.as_ref().and_then(|s| non_empty(&s.region))
    }

    pub fn speech_voice(&self) -> &str {
        self.speech
            .as_ref()
            .and_then(|s| non_empty(&s.voice))
            .unwrap_or(DEFAULT_VOICE)
    }

    pub fn speech_output_format(&self) -> &str {
        self.speech
            .as_ref()
            .and_then(|s| non_empty(&s.output_format))
            .unwrap_or(DEFAULT_OUTPUT_FORMAT)
    }

    pub fn speech_endpoint(&self) -> Option<&str> {
        self.speech.as_ref().and_then(|s| non_empty(&s.endpoint))
    }

    pub fn hunter_name(&self) -> &str {
        self.ui
            .as_ref()
            .and_then(|u| non_empty(&u.hunter_name))
            .unwrap_or(DEFAULT_HUNTER_NAME)
    }

    /// Get a config value by dotted path (e.g. "gateway.port", "speech.voice").
    pub fn get_path(&self, path: &str) -> Option<serde_json::Value> {
        let json = serde_json::to_value(self.redacted()).ok()?;
        let mut current = &json;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    /// Copy of the config with secret values masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(azure) = copy.azure.as_mut() {
            if azure.client_secret.as_deref().is_some_and(|s| !s.is_empty()) {
                azure.client_secret = Some(REDACTED.into());
            }
        }
        copy
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let azure = self.azure.clone().unwrap_or_default();
        let required: [(&str, Option<&str>); 9] = [
            ("azure.tenant_id (SP_TENANT_ID)", non_empty(&azure.tenant_id)),
            ("azure.client_id (SP_CLIENT_ID)", non_empty(&azure.client_id)),
            ("key_vault.url (AKV_URL)", self.vault_url()),
            ("storage.url (STORAGE_URL)", self.storage_url()),
            ("storage.container (STORAGE_CONTAINER)", self.storage_container()),
            ("vision.endpoint (COGNITIVE_URL)", self.vision_endpoint()),
            ("openai.endpoint (AOAI_URL)", self.openai_endpoint()),
            ("openai.deployment (AOAI_DEPLOYMENT)", self.openai_deployment()),
            ("speech.region (COGNITIVE_REGION)", self.speech_region()),
        ];
        for (name, value) in required {
            if value.is_none() {
                errors.push(format!("Missing required setting: {name}"));
            }
        }

        if azure.resolve_client_secret().is_none() {
            errors.push("Missing required setting: azure.client_secret (SP_CLIENT_SECRET)".into());
        }

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
        }

        if !(0.0..=2.0).contains(&self.openai_temperature()) {
            errors.push(format!(
                "openai.temperature must be between 0 and 2 (got {})",
                self.openai_temperature()
            ));
        }

        if self.secret_cache_ttl_secs() > 0 {
            warnings.push(format!(
                "Secret cache enabled ({}s): rotated keys are picked up only after expiry",
                self.secret_cache_ttl_secs()
            ));
        }

        for url in [self.vault_url(), self.storage_url(), self.vision_endpoint(), self.openai_endpoint()]
            .into_iter()
            .flatten()
        {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                errors.push(format!("Endpoint is not an http(s) URL: {url}"));
            }
        }

        (warnings, errors)
    }
}

/// Base directory for Treasure Hunt data: `~/.treasure_hunt/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".treasure_hunt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env_from(&[
            ("SP_TENANT_ID", "tenant"),
            ("SP_CLIENT_ID", "client"),
            ("SP_CLIENT_SECRET", "shh"),
            ("AKV_URL", "https://vault.vault.azure.net"),
            ("STORAGE_URL", "https://acct.blob.core.windows.net"),
            ("STORAGE_CONTAINER", "images"),
            ("COGNITIVE_URL", "https://vision.cognitiveservices.azure.com"),
            ("COGNITIVE_REGION", "eastus"),
            ("AOAI_URL", "https://aoai.openai.azure.com"),
            ("AOAI_DEPLOYMENT", "gpt-4o"),
        ])
    }

    #[test]
    fn test_env_var_substitution() {
        // SAFETY: test-only, variable name is unique to this test
        unsafe { std::env::set_var("TEST_TH_KEY", "sk-test-123") };
        let input = r#"{"key": "${TEST_TH_KEY}", "other": "plain"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains("sk-test-123"));
        assert!(result.contains("plain"));
        unsafe { std::env::remove_var("TEST_TH_KEY") };
    }

    #[test]
    fn test_env_var_missing() {
        let input = r#"{"key": "${NONEXISTENT_VAR_TH_TEST}"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains(r#""""#));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway_port(), 8080);
        assert_eq!(config.openai_key_secret(), "AOAI-KEY");
        assert_eq!(config.cognitive_key_secret(), "COGNITIVE-KEY");
        assert_eq!(config.speech_voice(), "en-US-AvaNeural");
        assert_eq!(config.secret_cache_ttl_secs(), 0);
        assert_eq!(config.hunter_name(), "Hunter X");
    }

    #[test]
    fn test_apply_env_fills_missing_fields() {
        let mut config = Config::default();
        config.apply_env(full_env());
        assert_eq!(config.vault_url(), Some("https://vault.vault.azure.net"));
        assert_eq!(config.storage_container(), Some("images"));
        assert_eq!(config.openai_deployment(), Some("gpt-4o"));
        assert_eq!(config.speech_region(), Some("eastus"));
        assert_eq!(
            config.azure.as_ref().and_then(|a| a.resolve_client_secret()),
            Some("shh".into())
        );
    }

    #[test]
    fn test_file_values_win_over_env() {
        let mut config: Config = json5::from_str(
            r#"{ storage: { container: "from-file" }, speech: { region: "westeurope" } }"#,
        )
        .unwrap();
        config.apply_env(full_env());
        assert_eq!(config.storage_container(), Some("from-file"));
        assert_eq!(config.speech_region(), Some("westeurope"));
        assert_eq!(config.storage_url(), Some("https://acct.blob.core.windows.net"));
    }

    #[test]
    fn test_load_json5_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                // comments are allowed
                gateway: { port: 9000 },
                key_vault: { url: "https://kv.vault.azure.net", cache_ttl_secs: 30 },
                ui: { hunter_name: "Hunter Y" },
            }"#,
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.gateway_port(), 9000);
        assert_eq!(config.vault_url(), Some("https://kv.vault.azure.net"));
        assert_eq!(config.secret_cache_ttl_secs(), 30);
        assert_eq!(config.hunter_name(), "Hunter Y");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert!(config.azure.is_none());
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ gateway: ").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, crate::error::HuntError::Config(_)));
    }

    #[test]
    fn test_validate_complete_config_has_no_errors() {
        let mut config = Config::default();
        config.apply_env(full_env());
        let (warnings, errors) = config.validate();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_validate_reports_missing_settings() {
        let (_warnings, errors) = Config::default().validate();
        assert!(errors.iter().any(|e| e.contains("AKV_URL")));
        assert!(errors.iter().any(|e| e.contains("SP_CLIENT_SECRET")));
        assert!(errors.iter().any(|e| e.contains("AOAI_DEPLOYMENT")));
    }

    #[test]
    fn test_openai_generation_defaults_and_range() {
        let config = Config::default();
        assert_eq!(config.openai_max_tokens(), 2048);
        assert!((config.openai_temperature() - 0.7).abs() < f64::EPSILON);

        let mut config = Config {
            openai: Some(OpenAiConfig {
                temperature: Some(3.5),
                ..OpenAiConfig::default()
            }),
            ..Config::default()
        };
        config.apply_env(full_env());
        let (_warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("temperature")));
    }

    #[test]
    fn test_validate_warns_on_secret_cache() {
        let mut config = Config {
            key_vault: Some(KeyVaultConfig {
                cache_ttl_secs: Some(60),
                ..KeyVaultConfig::default()
            }),
            ..Config::default()
        };
        config.apply_env(full_env());
        let (warnings, errors) = config.validate();
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.contains("cache")));
    }

    #[test]
    fn test_redacted_masks_client_secret() {
        let mut config = Config::default();
        config.apply_env(full_env());
        let shown = config.redacted();
        assert_eq!(
            shown.azure.as_ref().and_then(|a| a.client_secret.as_deref()),
            Some("***")
        );
        assert_eq!(config.get_path("azure.client_secret"), Some(serde_json::json!("***")));
        assert_eq!(config.get_path("storage.container"), Some(serde_json::json!("images")));
    }

    #[test]
    fn test_logging_config_defaults() {
        let config: Config = json5::from_str(r#"{ "logging": {} }"#).unwrap();
        let logging = config.logging.expect("logging should be present");
        assert_eq!(logging.format, "plain");
        assert!(logging.level.is_none());
        assert_eq!(logging.output, "stderr");
        assert!(logging.filters.is_empty());
    }
}
