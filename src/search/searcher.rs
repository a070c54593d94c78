use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};

use super::embedder::EmbeddingClient;
use super::store::{GenerationContext, IndexStore, SearchResult};

/// Upper bound on `k` per query; the index primitive allocates `k` slots.
pub const DEFAULT_MAX_K: usize = 1000;

pub struct Searcher {
    store: Arc<IndexStore>,
    client: EmbeddingClient,
    max_k: usize,
}

impl Searcher {
    pub fn new(store: Arc<IndexStore>, client: EmbeddingClient) -> Self {
        Self {
            store,
            client,
            max_k: DEFAULT_MAX_K,
        }
    }

    pub fn with_max_k(mut self, max_k: usize) -> Self {
        self.max_k = max_k.max(1);
        self
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Returns the `min(k, N)` chunks closest to `query`, closest first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let snapshot = self.store.snapshot().ok_or(Error::NotReady)?;

        if query.trim().is_empty() {
            return Err(Error::InvalidQuery("query text must not be empty".to_string()));
        }
        if k == 0 {
            return Err(Error::InvalidQuery("k must be greater than 0".to_string()));
        }
        if k > self.max_k {
            return Err(Error::InvalidQuery(format!(
                "k must not exceed {}",
                self.max_k
            )));
        }

        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.client.embed_one(query).await?;
        if query_vector.len() != snapshot.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: snapshot.dimensions(),
                actual: query_vector.len(),
            });
        }

        let slots = snapshot.index().search(&query_vector, k)?;
        let mut results = Vec::with_capacity(k.min(snapshot.len()));
        for neighbor in slots.into_iter().flatten() {
            let chunk = snapshot.chunk(neighbor.position).ok_or_else(|| {
                Error::CorruptArtifact(format!(
                    "index position {} has no metadata record",
                    neighbor.position
                ))
            })?;
            results.push(SearchResult::new(chunk, neighbor.distance));
        }

        debug!(k, hits = results.len(), "search complete");
        Ok(results)
    }

    /// Search results shaped for the generation step.
    pub async fn context(&self, query: &str, k: usize) -> Result<GenerationContext> {
        let results = self.search(query, k).await?;
        Ok(GenerationContext::from_results(query, &results))
    }
}
