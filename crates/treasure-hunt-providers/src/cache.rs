//! Short-lived in-memory secret cache.
//!
//! Wraps any [`SecretProvider`]. A zero TTL turns the cache off, so every
//! lookup goes to the wrapped provider. Failed lookups are never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use treasure_hunt_core::error::PipelineError;

use crate::SecretProvider;

struct CachedSecret {
    value: String,
    expires_at: Instant,
}

pub struct CachedSecretProvider {
    inner: Arc<dyn SecretProvider>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedSecret>>,
}

impl CachedSecretProvider {
    pub fn new(inner: Arc<dyn SecretProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SecretProvider for CachedSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String, PipelineError> {
        if self.ttl.is_zero() {
            return self.inner.get_secret(name).await;
        }

        if let Some(entry) = self.entries.read().await.get(name) {
            if Instant::now() < entry.expires_at {
                debug!(secret = name, "Secret cache hit");
                return Ok(entry.value.clone());
            }
        }

        let value = self.inner.get_secret(name).await?;
        self.entries.write().await.insert(
            name.to_string(),
            CachedSecret {
                value: value.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(value)
    }
}
