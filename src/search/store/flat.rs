use bincode::config::standard as bincode_config;
use bincode::{decode_from_slice, encode_to_vec, Decode, Encode};
use std::cmp::Ordering;

use crate::error::{Error, Result};

use super::squared_l2;

/// On-disk layout version of the index blob.
const FORMAT_VERSION: u32 = 1;

/// One filled result slot of a k-NN query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Exhaustive (brute force) vector index over squared Euclidean distance.
///
/// Vectors are stored row-major in a single buffer; position `i` is the
/// `i`-th vector added.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<f32>,
}

#[derive(Encode, Decode)]
struct IndexBlob {
    format_version: u32,
    dimensions: u64,
    count: u64,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Vec::new(),
        }
    }

    pub fn from_vectors(dimensions: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = Self::new(dimensions);
        index.vectors.reserve(dimensions * vectors.len());
        for vector in &vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.vectors.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimensions;
        Some(&self.vectors[start..start + self.dimensions])
    }

    /// k-NN lookup. Always returns exactly `k` slots ordered closest first;
    /// slots beyond the index size are `None`. Ties resolve to the lower
    /// position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Option<Neighbor>>> {
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimensions.max(1))
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        let take = k.min(scored.len());
        if take < scored.len() && take > 0 {
            scored.select_nth_unstable_by(take - 1, compare_neighbors);
        }
        scored.truncate(take);
        scored.sort_by(compare_neighbors);

        let mut slots: Vec<Option<Neighbor>> = scored.into_iter().map(Some).collect();
        slots.resize(k, None);
        Ok(slots)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let blob = IndexBlob {
            format_version: FORMAT_VERSION,
            dimensions: self.dimensions as u64,
            count: self.len() as u64,
            vectors: self.vectors.clone(),
        };
        encode_to_vec(&blob, bincode_config())
            .map_err(|e| Error::CorruptArtifact(format!("failed to encode index: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (blob, _): (IndexBlob, usize) = decode_from_slice(bytes, bincode_config())
            .map_err(|e| Error::CorruptArtifact(format!("failed to decode index: {e}")))?;

        if blob.format_version != FORMAT_VERSION {
            return Err(Error::CorruptArtifact(format!(
                "unsupported index format version {}",
                blob.format_version
            )));
        }

        let dimensions = blob.dimensions as usize;
        let expected = dimensions.checked_mul(blob.count as usize);
        if expected != Some(blob.vectors.len()) || (dimensions == 0 && blob.count != 0) {
            return Err(Error::CorruptArtifact(format!(
                "index header declares {} vectors of dimension {}, payload holds {} floats",
                blob.count,
                dimensions,
                blob.vectors.len()
            )));
        }

        Ok(Self {
            dimensions,
            vectors: blob.vectors,
        })
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.position.cmp(&b.position))
}
