//! Azure Key Vault secret lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use treasure_hunt_core::error::PipelineError;

use crate::auth::TokenCredential;
use crate::{SecretProvider, http_failure, url_with_segments};

const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";
const KEY_VAULT_API_VERSION: &str = "7.4";

pub struct KeyVaultSecrets {
    vault_url: String,
    credential: Arc<dyn TokenCredential>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    #[serde(default)]
    value: Option<String>,
}

impl KeyVaultSecrets {
    pub fn new(vault_url: &str, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            vault_url: vault_url.trim_end_matches('/').to_string(),
            credential,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SecretProvider for KeyVaultSecrets {
    async fn get_secret(&self, name: &str) -> Result<String, PipelineError> {
        let not_found = |detail: String| PipelineError::secret_not_found(name, detail);

        let token = self
            .credential
            .token(KEY_VAULT_SCOPE)
            .await
            .map_err(|e| not_found(format!("token acquisition failed: {e:#}")))?;

        let mut url = url_with_segments(&self.vault_url, ["secrets", name])
            .map_err(|e| not_found(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("api-version", KEY_VAULT_API_VERSION);

        debug!(secret = name, vault = %self.vault_url, "Fetching secret");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| not_found(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(not_found(http_failure(response).await));
        }

        let bundle: SecretBundle = response
            .json()
            .await
            .map_err(|e| not_found(format!("malformed secret bundle: {e}")))?;

        bundle
            .value
            .ok_or_else(|| not_found("secret has no value".to_string()))
    }
}
