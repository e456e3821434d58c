use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colloquy_core::config::{read_secret, DiscoveryConfig};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use super::{send, Endpoint};
use crate::error::{GatewayError, GatewayResult};
use crate::traits::KnowledgeGateway;
use crate::types::{Passage, SearchParams};

/// Knowledge gateway backed by the Watson Discovery v1 API.
pub struct DiscoveryClient {
    endpoint: Endpoint,
    environment_name: String,
    collection_name: String,
}

impl DiscoveryClient {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self::with_api_key(config, read_secret(&config.api_key_env))
    }

    pub fn with_api_key(config: &DiscoveryConfig, api_key: String) -> Self {
        Self {
            endpoint: Endpoint::new(&config.url, &config.version, api_key),
            environment_name: config.environment_name.clone(),
            collection_name: config.collection_name.clone(),
        }
    }

    /// Find a writable environment, creating one when the account has none.
    async fn ensure_environment(&self) -> GatewayResult<String> {
        let list: EnvironmentList = send(self.endpoint.get("v1/environments")?)
            .await?
            .json()
            .await?;
        if let Some(env) = pick_environment(&list.environments, &self.environment_name) {
            return Ok(env.environment_id.clone());
        }

        tracing::info!("Creating Discovery environment '{}'", self.environment_name);
        let req = self.endpoint.post("v1/environments")?.json(&json!({
            "name": self.environment_name,
            "description": "Colloquy knowledge base",
        }));
        let created: EnvironmentEntry = send(req).await?.json().await?;
        Ok(created.environment_id)
    }

    async fn ensure_collection(&self, environment_id: &str) -> GatewayResult<String> {
        let path = format!("v1/environments/{environment_id}/collections");
        let list: CollectionList = send(self.endpoint.get(&path)?).await?.json().await?;
        if let Some(c) = list
            .collections
            .into_iter()
            .find(|c| c.name == self.collection_name)
        {
            return Ok(c.collection_id);
        }

        tracing::info!("Creating Discovery collection '{}'", self.collection_name);
        let req = self.endpoint.post(&path)?.json(&json!({
            "name": self.collection_name,
            "language": "en",
        }));
        let created: CollectionEntry = send(req).await?.json().await?;
        Ok(created.collection_id)
    }

    async fn document_count(&self, params: &SearchParams) -> GatewayResult<u64> {
        let path = format!(
            "v1/environments/{}/collections/{}",
            params.environment_id, params.collection_id
        );
        let details: CollectionDetails = send(self.endpoint.get(&path)?).await?.json().await?;
        Ok(details.document_counts.available + details.document_counts.processing)
    }

    async fn upload(&self, params: &SearchParams, document: &Path) -> GatewayResult<()> {
        let bytes = tokio::fs::read(document).await.map_err(|e| {
            GatewayError::Config(format!("Cannot read {}: {e}", document.display()))
        })?;
        let file_name = document
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".into());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.clone()));
        let path = format!(
            "v1/environments/{}/collections/{}/documents",
            params.environment_id, params.collection_id
        );
        send(self.endpoint.post(&path)?.multipart(form)).await?;
        tracing::info!("Uploaded {file_name} to Discovery");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct EnvironmentList {
    #[serde(default)]
    environments: Vec<EnvironmentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct EnvironmentEntry {
    environment_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    read_only: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    #[serde(default)]
    collections: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    collection_id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CollectionDetails {
    #[serde(default)]
    document_counts: DocumentCounts,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentCounts {
    #[serde(default)]
    available: u64,
    #[serde(default)]
    processing: u64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    passages: Vec<Passage>,
}

/// Prefer the named environment; otherwise any writable one.
/// The shared read-only news environment is never used.
fn pick_environment<'a>(
    environments: &'a [EnvironmentEntry],
    name: &str,
) -> Option<&'a EnvironmentEntry> {
    environments
        .iter()
        .filter(|e| !e.read_only)
        .find(|e| e.name == name)
        .or_else(|| environments.iter().find(|e| !e.read_only))
}

#[async_trait]
impl KnowledgeGateway for DiscoveryClient {
    async fn prepare(&self, documents: &[PathBuf]) -> GatewayResult<SearchParams> {
        let environment_id = self.ensure_environment().await?;
        let collection_id = self.ensure_collection(&environment_id).await?;
        let params = SearchParams {
            environment_id,
            collection_id,
        };

        if self.document_count(&params).await? == 0 {
            if documents.is_empty() {
                tracing::warn!("Discovery collection is empty and no documents are configured");
            }
            for doc in documents {
                self.upload(&params, doc).await?;
            }
        }
        Ok(params)
    }

    async fn query(&self, text: &str, params: &SearchParams) -> GatewayResult<Vec<Passage>> {
        let path = format!(
            "v1/environments/{}/collections/{}/query",
            params.environment_id, params.collection_id
        );
        let req = self
            .endpoint
            .get(&path)?
            .query(&[("natural_language_query", text), ("passages", "true")]);
        let resp: QueryResponse = send(req).await?.json().await?;
        tracing::debug!("Discovery returned {} passages", resp.passages.len());
        Ok(resp.passages)
    }
}
