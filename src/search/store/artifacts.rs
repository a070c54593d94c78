use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{Chunk, FlatIndex, IndexSnapshot};

pub const INDEX_FILE: &str = "index.bin";
pub const METADATA_FILE: &str = "metadata.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// Completion marker of a published index. Written last; its digests tie
/// the index blob and the metadata array together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub format_version: u32,
    pub model: String,
    pub dimensions: usize,
    pub count: usize,
    pub created_at: DateTime<Utc>,
    pub index_sha256: String,
    pub metadata_sha256: String,
}

/// Location of the artifact triple inside an index directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn metadata(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn manifest(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// True when a manifest has been published, regardless of validity.
    pub fn is_published(&self) -> bool {
        self.manifest().exists()
    }

    /// Publishes index and metadata as one unit.
    ///
    /// All three files are staged first; a staging failure leaves the
    /// previous publication untouched. The old manifest is then withdrawn,
    /// the data files renamed into place and the new manifest renamed last,
    /// so a reader that validates the manifest digests never accepts a
    /// mixed pair.
    pub fn write(&self, model: &str, index: &FlatIndex, metadata: &[Chunk]) -> Result<Manifest> {
        if index.len() != metadata.len() {
            return Err(Error::CorruptArtifact(format!(
                "refusing to publish {} vectors with {} metadata records",
                index.len(),
                metadata.len()
            )));
        }

        fs::create_dir_all(&self.dir)?;

        let index_bytes = index.to_bytes()?;
        let metadata_bytes = serde_json::to_vec_pretty(metadata)
            .map_err(|e| Error::CorruptArtifact(format!("failed to encode metadata: {e}")))?;

        let manifest = Manifest {
            format_version: MANIFEST_VERSION,
            model: model.to_string(),
            dimensions: index.dimensions(),
            count: index.len(),
            created_at: Utc::now(),
            index_sha256: sha256_hex(&index_bytes),
            metadata_sha256: sha256_hex(&metadata_bytes),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| Error::CorruptArtifact(format!("failed to encode manifest: {e}")))?;

        let targets = [self.index(), self.metadata(), self.manifest()];
        let staged = stage(&[
            (targets[0].as_path(), index_bytes.as_slice()),
            (targets[1].as_path(), metadata_bytes.as_slice()),
            (targets[2].as_path(), manifest_bytes.as_slice()),
        ])?;

        remove_if_exists(&self.manifest())?;
        for (temp_path, target) in staged.iter().zip(&targets) {
            fs::rename(temp_path, target)?;
        }

        Ok(manifest)
    }

    pub fn read_manifest(&self) -> Result<Manifest> {
        let bytes = read_artifact(&self.manifest())?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::CorruptArtifact(format!("invalid manifest: {e}")))
    }

    /// Reads and cross-checks the published triple.
    pub fn read(&self) -> Result<IndexSnapshot> {
        let manifest = self.read_manifest()?;

        let index_bytes = read_artifact(&self.index())?;
        if sha256_hex(&index_bytes) != manifest.index_sha256 {
            return Err(Error::CorruptArtifact(
                "index digest does not match manifest".to_string(),
            ));
        }

        let metadata_bytes = read_artifact(&self.metadata())?;
        if sha256_hex(&metadata_bytes) != manifest.metadata_sha256 {
            return Err(Error::CorruptArtifact(
                "metadata digest does not match manifest".to_string(),
            ));
        }

        let index = FlatIndex::from_bytes(&index_bytes)?;
        let metadata: Vec<Chunk> = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| Error::CorruptArtifact(format!("invalid metadata: {e}")))?;

        if index.dimensions() != manifest.dimensions || index.len() != manifest.count {
            return Err(Error::CorruptArtifact(format!(
                "manifest declares {} vectors of dimension {}, index holds {} of dimension {}",
                manifest.count,
                manifest.dimensions,
                index.len(),
                index.dimensions()
            )));
        }

        IndexSnapshot::new(index, metadata, manifest)
    }
}

/// Writes each payload next to its target as `<name>.tmp`. On failure the
/// temp files written so far are removed.
fn stage(files: &[(&Path, &[u8])]) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(files.len());
    for &(target, bytes) in files {
        let temp_path = target.with_extension("tmp");
        if let Err(e) = fs::write(&temp_path, bytes) {
            for path in &staged {
                let _ = fs::remove_file(path);
            }
            return Err(e.into());
        }
        staged.push(temp_path);
    }
    Ok(staged)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Missing files count as a corrupt (incomplete) publication.
fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == IoErrorKind::NotFound {
            Error::CorruptArtifact(format!("{} is missing", path.display()))
        } else {
            Error::Io(e)
        }
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
