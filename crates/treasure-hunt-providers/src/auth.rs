//! Azure AD client-credentials token source.
//!
//! Built once at startup and shared by the Key Vault and Blob Storage
//! adapters. Tokens are cached per scope until shortly before expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Refresh tokens this long before the server-reported expiry.
const EXPIRY_SKEW: Duration = Duration::from_secs(120);

/// Something that can hand out bearer tokens for an OAuth scope.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self, scope: &str) -> anyhow::Result<String>;
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Service-principal credential (tenant id + client id + client secret).
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    client: reqwest::Client,
    tokens: RwLock<HashMap<String, CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authority_host: &str,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authority_host: authority_host.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Build from the `azure` config section.
    pub fn from_config(config: &treasure_hunt_core::config::Config) -> anyhow::Result<Self> {
        let azure = config
            .azure
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("azure section missing (SP_TENANT_ID, SP_CLIENT_ID)"))?;
        let tenant_id = azure
            .tenant_id
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("azure.tenant_id not configured"))?;
        let client_id = azure
            .client_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow::anyhow!("azure.client_id not configured"))?;
        let client_secret = azure
            .resolve_client_secret()
            .ok_or_else(|| anyhow::anyhow!("azure.client_secret not configured"))?;
        Ok(Self::new(
            tenant_id,
            client_id,
            client_secret,
            azure.authority_host(),
        ))
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }

    async fn request_token(&self, scope: &str) -> anyhow::Result<TokenResponse> {
        debug!(scope, tenant = %self.tenant_id, "Requesting client-credentials token");

        let response = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token request failed {status}: {body}");
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self, scope: &str) -> anyhow::Result<String> {
        if let Some(cached) = self.tokens.read().await.get(scope) {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.request_token(scope).await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_SKEW);
        self.tokens.write().await.insert(
            scope.to_string(),
            CachedToken {
                access_token: fresh.access_token.clone(),
                refresh_at: Instant::now() + lifetime,
            },
        );
        Ok(fresh.access_token)
    }
}
