use serde::{Deserialize, Serialize};

/// A bounded span of a source document, the unit that gets indexed.
///
/// Serialized field names match the persisted metadata array
/// (`{chunk_id, doc, chunk_index, text, page?}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: String,
    #[serde(rename = "doc")]
    pub source_document: String,
    pub chunk_index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

/// Source fields of a chunk returned alongside a hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultMetadata {
    pub chunk_id: String,
    pub doc: String,
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub metadata: ResultMetadata,
    /// Squared Euclidean distance to the query; lower is closer.
    pub score: f32,
}

impl SearchResult {
    pub fn new(chunk: &Chunk, score: f32) -> Self {
        Self {
            text: chunk.text.clone(),
            metadata: ResultMetadata {
                chunk_id: chunk.chunk_id.clone(),
                doc: chunk.source_document.clone(),
                chunk_index: chunk.chunk_index,
                page: chunk.page,
            },
            score,
        }
    }
}

/// Payload handed to the generation step: the user's prompt plus
/// retrieved snippets in rank order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationContext {
    pub prompt_usuario: String,
    pub contexto_rag: Vec<String>,
}

impl GenerationContext {
    pub fn from_results(prompt: &str, results: &[SearchResult]) -> Self {
        Self {
            prompt_usuario: prompt.to_string(),
            contexto_rag: results.iter().map(|r| r.text.clone()).collect(),
        }
    }
}
