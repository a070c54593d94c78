use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

use super::store::Chunk;

/// Page break marker used by text extracted from paginated sources.
const PAGE_BREAK: char = '\x0c';

/// Raw document text before chunking.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// One sliding window over the whole document.
    #[default]
    Window,
    /// Split on form feeds first, then window each page.
    Pages,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    strategy: ChunkStrategy,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
            strategy: ChunkStrategy::Window,
        }
    }
}

impl Chunker {
    /// Sizes are in characters. Fails unless `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            strategy: ChunkStrategy::Window,
        })
    }

    pub fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    pub fn chunk_document(&self, doc: &SourceDocument) -> Vec<Chunk> {
        match self.strategy {
            ChunkStrategy::Window => self.chunk_by_window(doc),
            ChunkStrategy::Pages => self.chunk_by_pages(doc),
        }
    }

    pub fn chunk_all(&self, docs: &[SourceDocument]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.chunk_document(doc)).collect()
    }

    pub fn chunk_by_window(&self, doc: &SourceDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        self.push_windows(doc, &doc.text, None, 0, &mut chunks);
        chunks
    }

    /// `chunk_index` keeps counting across pages; `page` is 0-based.
    pub fn chunk_by_pages(&self, doc: &SourceDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut next_index = 0;
        for (page, text) in doc.text.split(PAGE_BREAK).enumerate() {
            next_index = self.push_windows(doc, text, Some(page), next_index, &mut chunks);
        }
        chunks
    }

    /// Windows `text` starting at `first_index` and returns the next unused
    /// index. Indices count every window, including dropped blank ones.
    fn push_windows(
        &self,
        doc: &SourceDocument,
        text: &str,
        page: Option<usize>,
        first_index: usize,
        chunks: &mut Vec<Chunk>,
    ) -> usize {
        let chars: Vec<char> = text.chars().collect();
        let stride = self.stride();
        let mut index = first_index;
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();

            if !trimmed.is_empty() {
                chunks.push(Chunk {
                    chunk_id: chunk_id(&doc.name, index, trimmed),
                    source_document: doc.name.clone(),
                    chunk_index: index,
                    text: trimmed.to_string(),
                    page,
                });
            }

            index += 1;
            if end == chars.len() {
                break;
            }
            start += stride;
        }

        index
    }
}

fn chunk_id(doc: &str, index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc.as_bytes());
    hasher.update([0]);
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rebuilds the source from untrimmed windows by dropping each overlap.
    fn reconstruct(text: &str, size: usize, overlap: usize) -> String {
        let chars: Vec<char> = text.chars().collect();
        let stride = size - overlap;
        let mut out = String::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + size).min(chars.len());
            let skip = if start == 0 { 0 } else { overlap };
            out.extend(&chars[start + skip..end]);
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        out
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(Chunker::new(10, 10).is_err());
        assert!(Chunker::new(10, 11).is_err());
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_window_offsets() {
        let chunker = Chunker::new(4, 1).unwrap();
        let doc = SourceDocument::new("a.txt", "abcdefghij");
        let chunks = chunker.chunk_document(&doc);

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
        let indices: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(chunks.iter().all(|c| c.page.is_none()));
    }

    #[test]
    fn test_final_chunk_may_be_shorter() {
        let chunker = Chunker::new(5, 2).unwrap();
        let chunks = chunker.chunk_document(&SourceDocument::new("a", "abcdefghijk"));
        assert_eq!(chunks.last().unwrap().text, "ghijk");
        let chunks = chunker.chunk_document(&SourceDocument::new("a", "abcdefgh"));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcde", "defgh"]);
    }

    #[test]
    fn test_blank_windows_dropped_without_renumbering() {
        let chunker = Chunker::new(4, 0).unwrap();
        let doc = SourceDocument::new("a", "abcd        efgh");
        let chunks = chunker.chunk_document(&doc);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 3);
        assert_eq!(chunks[1].text, "efgh");
    }

    #[test]
    fn test_trimming_does_not_shift_windows() {
        let chunker = Chunker::new(5, 0).unwrap();
        let chunks = chunker.chunk_document(&SourceDocument::new("a", "  ab cdefg"));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "cdefg"]);
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let chunker = Chunker::new(3, 1).unwrap();
        let chunks = chunker.chunk_document(&SourceDocument::new("a", "cartão"));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["car", "rtã", "ão"]);
    }

    #[test]
    fn test_empty_document() {
        let chunker = Chunker::default();
        assert!(chunker.chunk_document(&SourceDocument::new("a", "")).is_empty());
        assert!(chunker.chunk_document(&SourceDocument::new("a", " \n\t ")).is_empty());
    }

    #[test]
    fn test_coverage_reconstructs_text() {
        let text = "Artigo 1. Os membros devem zelar pelo patrimônio.\n\
                    Artigo 5: uso indevido de cartão corporativo é vedado.";
        for (size, overlap) in [(7, 0), (10, 3), (16, 15), (200, 20)] {
            assert_eq!(reconstruct(text, size, overlap), text);

            let chunker = Chunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk_document(&SourceDocument::new("a", text));
            let stride = size - overlap;
            let chars: Vec<char> = text.chars().collect();
            for chunk in &chunks {
                let start = chunk.chunk_index * stride;
                let end = (start + size).min(chars.len());
                let window: String = chars[start..end].iter().collect();
                assert_eq!(chunk.text, window.trim());
            }
        }
    }

    #[test]
    fn test_pages_strategy() {
        let chunker = Chunker::new(6, 0).unwrap().with_strategy(ChunkStrategy::Pages);
        let doc = SourceDocument::new("regimento.pdf", "pagina um\x0cdois");
        let chunks = chunker.chunk_document(&doc);

        let summary: Vec<(usize, Option<usize>, &str)> = chunks
            .iter()
            .map(|c| (c.chunk_index, c.page, c.text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(0, Some(0), "pagina"), (1, Some(0), "um"), (2, Some(1), "dois")]
        );
    }

    #[test]
    fn test_chunk_ids_are_deterministic_and_distinct() {
        let chunker = Chunker::new(4, 0).unwrap();
        let doc = SourceDocument::new("a", "abcdabcd");
        let first = chunker.chunk_document(&doc);
        let second = chunker.chunk_document(&doc);

        assert_eq!(first, second);
        assert_ne!(first[0].chunk_id, first[1].chunk_id);
        assert_eq!(first[0].chunk_id.len(), 16);
    }

    #[test]
    fn test_chunk_all_keeps_document_order() {
        let chunker = Chunker::new(10, 0).unwrap();
        let docs = vec![
            SourceDocument::new("b.txt", "segundo"),
            SourceDocument::new("a.txt", "primeiro"),
        ];
        let chunks = chunker.chunk_all(&docs);
        let names: Vec<&str> = chunks.iter().map(|c| c.source_document.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "a.txt"]);
        assert!(chunks.iter().all(|c| c.chunk_index == 0));
    }
}
