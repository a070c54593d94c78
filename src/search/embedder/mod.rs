mod client;
mod model;
mod ollama;

pub use client::EmbeddingClient;
pub use model::EmbeddingModel;
pub use ollama::OllamaEmbedder;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// A single embedding provider. `embed_batch` issues exactly one provider
/// request; batching and ordering across requests live in
/// [`EmbeddingClient`].
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn model(&self) -> &str;
    fn dimensions(&self) -> usize;
    async fn health_check(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub provider: String,
    /// Short code (`nomic`, `mxbai`, `minilm`) or a full model name.
    pub model: String,
    pub endpoint: Option<String>,
    /// Required for models outside the known table.
    pub dimensions: Option<usize>,
    pub batch_size: usize,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            endpoint: None,
            dimensions: None,
            batch_size: 32,
            concurrency: 4,
            timeout_secs: 30,
        }
    }
}

impl EmbedderConfig {
    pub fn resolved_model(&self) -> EmbeddingModel {
        EmbeddingModel::parse(&self.model)
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

pub fn create_embedder(config: &EmbedderConfig) -> Result<Box<dyn Embedder>> {
    if config.provider != "ollama" {
        return Err(crate::error::Error::Config(format!(
            "unsupported embedding provider '{}'",
            config.provider
        )));
    }

    let model = config.resolved_model();
    let dimensions = config
        .dimensions
        .or_else(|| model.known_dimensions())
        .ok_or_else(|| {
            crate::error::Error::Config(format!(
                "embedding dimensions must be configured for custom model '{}'",
                model.name()
            ))
        })?;

    Ok(Box::new(OllamaEmbedder::new(
        &config.endpoint(),
        model.name(),
        dimensions,
        config.timeout(),
    )?))
}
