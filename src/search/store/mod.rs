mod artifacts;
mod flat;
mod types;

pub use artifacts::{ArtifactPaths, Manifest, INDEX_FILE, MANIFEST_FILE, METADATA_FILE};
pub use flat::{FlatIndex, Neighbor};
pub use types::{Chunk, GenerationContext, ResultMetadata, SearchResult};

use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

/// An index and its positionally aligned metadata, validated at
/// construction and immutable afterwards.
#[derive(Debug)]
pub struct IndexSnapshot {
    index: FlatIndex,
    metadata: Vec<Chunk>,
    manifest: Manifest,
}

impl IndexSnapshot {
    pub fn new(index: FlatIndex, metadata: Vec<Chunk>, manifest: Manifest) -> Result<Self> {
        if index.len() != metadata.len() {
            return Err(Error::CorruptArtifact(format!(
                "index holds {} vectors but metadata holds {} records",
                index.len(),
                metadata.len()
            )));
        }
        Ok(Self {
            index,
            metadata,
            manifest,
        })
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.metadata.get(position)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.metadata
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    NotReady,
    Ready,
}

impl ReadyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyState::NotReady => "not_ready",
            ReadyState::Ready => "ready",
        }
    }
}

/// Holds the serving snapshot. Starts empty and accepts exactly one
/// publish; readers get a shared handle without locking.
#[derive(Debug, Default)]
pub struct IndexStore {
    snapshot: OnceLock<Arc<IndexSnapshot>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that is ready from the start, for one-shot CLI queries.
    pub fn ready(snapshot: IndexSnapshot) -> Self {
        let store = Self::new();
        let _ = store.snapshot.set(Arc::new(snapshot));
        store
    }

    pub fn state(&self) -> ReadyState {
        if self.snapshot.get().is_some() {
            ReadyState::Ready
        } else {
            ReadyState::NotReady
        }
    }

    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.snapshot.get().cloned()
    }

    /// Publishes the snapshot. Returns `false` if one was already published,
    /// in which case the argument is dropped and the existing one stays.
    pub fn publish(&self, snapshot: IndexSnapshot) -> bool {
        self.snapshot.set(Arc::new(snapshot)).is_ok()
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
