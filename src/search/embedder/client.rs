use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};

use super::Embedder;

/// Splits arbitrary input lists into provider-sized batches and stitches
/// the answers back together in input order. No retries: the first failing
/// batch fails the whole call and partial output is discarded.
#[derive(Clone)]
pub struct EmbeddingClient {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    concurrency: usize,
}

impl EmbeddingClient {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize, concurrency: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn model(&self) -> &str {
        self.embedder.model()
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<&[String]> = texts.chunks(self.batch_size).collect();
        debug!(
            inputs = texts.len(),
            batches = batches.len(),
            concurrency = self.concurrency,
            "embedding inputs"
        );

        // `buffered` yields in submission order, so batch boundaries stay
        // invisible to the caller.
        let results: Vec<Vec<Vec<f32>>> = stream::iter(batches)
            .map(|batch| async move {
                let vectors = self.embedder.embed_batch(batch).await?;
                if vectors.len() != batch.len() {
                    return Err(Error::MalformedResponse(format!(
                        "provider returned {} embeddings for {} inputs",
                        vectors.len(),
                        batch.len()
                    )));
                }
                Ok::<_, Error>(vectors)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let vectors: Vec<Vec<f32>> = results.into_iter().flatten().collect();

        let dimensions = vectors[0].len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(Error::MalformedResponse(format!(
                "inconsistent embedding dimensions: {} and {}",
                dimensions,
                bad.len()
            )));
        }

        Ok(vectors)
    }

    /// Embeds a single query text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embedder.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(Error::MalformedResponse(format!(
                "provider returned {} embeddings for 1 input",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }
}
