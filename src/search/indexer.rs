use tracing::info;

use crate::error::{Error, Result};

use super::chunker::{Chunker, SourceDocument};
use super::embedder::EmbeddingClient;
use super::store::{ArtifactPaths, Chunk, FlatIndex, Manifest};

pub struct Indexer {
    client: EmbeddingClient,
    chunker: Chunker,
}

/// Index and metadata built in memory, aligned by position.
#[derive(Debug)]
pub struct BuiltIndex {
    pub index: FlatIndex,
    pub metadata: Vec<Chunk>,
}

#[derive(Debug)]
pub struct IndexResult {
    pub documents: usize,
    pub chunks: usize,
    pub manifest: Manifest,
}

impl Indexer {
    pub fn new(client: EmbeddingClient, chunker: Chunker) -> Self {
        Self { client, chunker }
    }

    /// Chunks and embeds the corpus. Any embedding failure aborts the build.
    pub async fn build(&self, documents: &[SourceDocument]) -> Result<BuiltIndex> {
        let metadata = self.chunker.chunk_all(documents);
        info!(
            documents = documents.len(),
            chunks = metadata.len(),
            "chunked corpus"
        );

        let texts: Vec<String> = metadata.iter().map(|c| c.text.clone()).collect();
        let vectors = self.client.embed(&texts).await?;

        if vectors.len() != metadata.len() {
            return Err(Error::MalformedResponse(format!(
                "received {} embeddings for {} chunks",
                vectors.len(),
                metadata.len()
            )));
        }

        let dimensions = vectors
            .first()
            .map(Vec::len)
            .unwrap_or_else(|| self.client.dimensions());
        let index = FlatIndex::from_vectors(dimensions, vectors)?;

        Ok(BuiltIndex { index, metadata })
    }

    /// Builds the corpus and publishes it to `paths`. Nothing is written
    /// unless the whole build succeeds.
    pub async fn index_all(
        &self,
        documents: &[SourceDocument],
        paths: &ArtifactPaths,
    ) -> Result<IndexResult> {
        let built = self.build(documents).await?;
        let manifest = paths.write(self.client.model(), &built.index, &built.metadata)?;

        info!(
            dir = %paths.dir().display(),
            chunks = manifest.count,
            dimensions = manifest.dimensions,
            "published index"
        );

        Ok(IndexResult {
            documents: documents.len(),
            chunks: built.metadata.len(),
            manifest,
        })
    }
}
