use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

use super::Embedder;

pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    dimensions: usize,
    client: Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaEmbedder {
    pub fn new(endpoint: &str, model: &str, dimensions: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            client,
        })
    }

    fn unreachable(&self, e: reqwest::Error) -> Error {
        if e.is_connect() {
            Error::ProviderUnavailable(format!(
                "cannot connect to Ollama at {}. Is `ollama serve` running?",
                self.endpoint
            ))
        } else {
            Error::ProviderUnavailable(format!("Ollama request failed: {e}"))
        }
    }

    /// Checks count and dimension of a decoded response against the request.
    fn validate(&self, expected: usize, response: EmbedResponse) -> Result<Vec<Vec<f32>>> {
        let embeddings = response.embeddings.ok_or_else(|| {
            Error::MalformedResponse("response has no `embeddings` field".to_string())
        })?;

        if embeddings.len() != expected {
            return Err(Error::MalformedResponse(format!(
                "provider returned {} embeddings for {} inputs",
                embeddings.len(),
                expected
            )));
        }

        if let Some(bad) = embeddings.iter().find(|v| v.len() != self.dimensions) {
            return Err(Error::MalformedResponse(format!(
                "expected vectors of dimension {}, got {}",
                self.dimensions,
                bad.len()
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 || body.contains("not found") {
                return Err(Error::ProviderUnavailable(format!(
                    "model '{}' not found. Pull it with: ollama pull {}",
                    self.model, self.model
                )));
            }

            return Err(Error::ProviderUnavailable(format!(
                "Ollama error ({status}): {body}"
            )));
        }

        let body = response.bytes().await.map_err(|e| self.unreachable(e))?;
        let parsed: EmbedResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::MalformedResponse(format!("invalid JSON from provider: {e}")))?;

        debug!(inputs = texts.len(), model = %self.model, "embedded batch");
        self.validate(texts.len(), parsed)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !response.status().is_success() {
            return Err(Error::ProviderUnavailable(format!(
                "Ollama health check failed ({})",
                response.status()
            )));
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(format!("invalid tags response: {e}")))?;
        let model_available = tags
            .models
            .iter()
            .any(|m| m.name.starts_with(&self.model) || m.name == format!("{}:latest", self.model));

        if !model_available {
            return Err(Error::ProviderUnavailable(format!(
                "model '{}' not installed. Pull it with: ollama pull {}",
                self.model, self.model
            )));
        }

        Ok(())
    }
}
