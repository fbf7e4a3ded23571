//! Azure Blob Storage access: fetch-by-name and container listing.
//!
//! Objects are read eagerly into memory. Inputs are small images, so no
//! streaming is attempted.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use treasure_hunt_core::error::PipelineError;

use crate::auth::TokenCredential;
use crate::{ObjectStore, http_failure, url_with_segments};

const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";
const STORAGE_API_VERSION: &str = "2021-08-06";

static BLOB_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Blob>.*?<Name>([^<]*)</Name>").expect("static regex"));
static NEXT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<NextMarker>([^<]*)</NextMarker>").expect("static regex"));

pub struct BlobStore {
    account_url: String,
    container: String,
    credential: Arc<dyn TokenCredential>,
    client: reqwest::Client,
}

impl BlobStore {
    pub fn new(account_url: &str, container: &str, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            account_url: account_url.trim_end_matches('/').to_string(),
            container: container.to_string(),
            credential,
            client: reqwest::Client::new(),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        request
            .bearer_auth(token)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("x-ms-date", date)
    }
}

#[async_trait]
impl ObjectStore for BlobStore {
    async fn get_object(&self, name: &str) -> Result<Vec<u8>, PipelineError> {
        let not_found = |detail: String| PipelineError::object_not_found(name, detail);

        if has_dot_segment(name) {
            return Err(not_found("blob names may not contain '.' or '..' segments".into()));
        }

        let token = self
            .credential
            .token(STORAGE_SCOPE)
            .await
            .map_err(|e| not_found(format!("token acquisition failed: {e:#}")))?;

        // Virtual directories keep their '/' separators.
        let segments = std::iter::once(self.container.as_str()).chain(name.split('/'));
        let url = url_with_segments(&self.account_url, segments)
            .map_err(|e| not_found(e.to_string()))?;

        debug!(blob = name, container = %self.container, "Downloading blob");

        let response = self
            .authorized(self.client.get(url), &token)
            .send()
            .await
            .map_err(|e| not_found(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(not_found(http_failure(response).await));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| not_found(format!("reading body failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn list_objects(&self) -> anyhow::Result<Vec<String>> {
        let token = self.credential.token(STORAGE_SCOPE).await?;
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut url = url_with_segments(&self.account_url, [self.container.as_str()])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("restype", "container");
                query.append_pair("comp", "list");
                if let Some(ref m) = marker {
                    query.append_pair("marker", m);
                }
            }

            let response = self
                .authorized(self.client.get(url), &token)
                .send()
                .await?;
            if !response.status().is_success() {
                anyhow::bail!("List blobs failed: {}", http_failure(response).await);
            }

            let xml = response.text().await?;
            let (page, next) = parse_blob_list(&xml);
            names.extend(page);

            match next {
                Some(m) => marker = Some(m),
                None => break,
            }
        }

        info!(count = names.len(), container = %self.container, "Listed blobs");
        Ok(names)
    }
}

/// URL path normalization would resolve these and address a different blob.
fn has_dot_segment(name: &str) -> bool {
    name.split('/').any(|segment| segment == "." || segment == "..")
}

/// Extract blob names and the continuation marker from a List Blobs response.
pub fn parse_blob_list(xml: &str) -> (Vec<String>, Option<String>) {
    let names = BLOB_NAME_RE
        .captures_iter(xml)
        .map(|c| unescape_xml(&c[1]))
        .collect();
    let next = NEXT_MARKER_RE
        .captures(xml)
        .map(|c| unescape_xml(&c[1]))
        .filter(|m| !m.is_empty());
    (names, next)
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
