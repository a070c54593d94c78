use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::search::{ChunkStrategy, Chunker, EmbedderConfig, LoaderConfig, DEFAULT_MAX_K};

pub const DEFAULT_CONFIG_FILE: &str = "temis.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub embedder: EmbedderConfig,
    pub index: IndexConfig,
    pub server: ServerConfig,
    pub loader: LoaderConfig,
}

/// Sizes are in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub strategy: ChunkStrategy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            strategy: ChunkStrategy::Window,
        }
    }
}

impl ChunkingConfig {
    pub fn chunker(&self) -> Result<Chunker> {
        Ok(Chunker::new(self.chunk_size, self.chunk_overlap)?.with_strategy(self.strategy))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./index"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub default_k: usize,
    pub max_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            default_k: 5,
            max_k: DEFAULT_MAX_K,
        }
    }
}

impl Config {
    /// Loads `path` if given, else `temis.toml` from the working directory
    /// when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.chunking.chunker()?;
        Ok(config)
    }
}
