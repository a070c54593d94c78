use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::search::ChunkStrategy;

#[derive(Parser, Debug)]
#[command(
    name = "temis-retriever",
    version,
    about = "Build and serve a semantic search index over a document corpus"
)]
pub struct Args {
    /// Path to a TOML config file (defaults to ./temis.toml when present).
    #[arg(long, global = true, env = "TEMIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding index.bin, metadata.json and manifest.json.
    #[arg(long, global = true, env = "INDEX_DIR")]
    pub index_dir: Option<PathBuf>,

    /// Base URL of the Ollama embedding provider.
    #[arg(long, global = true, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Embedding model name or short code (nomic, mxbai, minilm).
    #[arg(long, global = true, env = "EMBED_MODEL")]
    pub model: Option<String>,

    /// Embedding dimension, required for models outside the known table.
    #[arg(long, global = true, env = "EMBED_DIMENSIONS")]
    pub dimensions: Option<usize>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and publish an index for a document directory.
    Index {
        /// Directory of .txt / .md documents.
        docs: PathBuf,

        #[arg(long, value_enum)]
        strategy: Option<ChunkStrategy>,

        /// Chunk size in characters.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Overlap between consecutive chunks in characters.
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Replace an already published index.
        #[arg(long)]
        force: bool,
    },

    /// Serve the HTTP search API, waiting for the index if necessary.
    Serve {
        /// Address to bind (host:port).
        #[arg(long, env = "RETRIEVER_BIND")]
        bind: Option<String>,
    },

    /// Run a single query against the published index.
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        k: usize,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the manifest of the published index.
    Status,
}

impl Args {
    /// File config with global flag overrides applied.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(dir) = &self.index_dir {
            config.index.dir = dir.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.embedder.endpoint = Some(url.clone());
        }
        if let Some(model) = &self.model {
            config.embedder.model = model.clone();
        }
        if let Some(dimensions) = self.dimensions {
            config.embedder.dimensions = Some(dimensions);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_command() {
        let args = Args::try_parse_from([
            "temis-retriever",
            "index",
            "./normas",
            "--strategy",
            "pages",
            "--chunk-size",
            "300",
            "--index-dir",
            "/tmp/idx",
        ])
        .unwrap();

        match &args.command {
            Command::Index {
                docs,
                strategy,
                chunk_size,
                force,
                ..
            } => {
                assert_eq!(docs, &PathBuf::from("./normas"));
                assert_eq!(*strategy, Some(ChunkStrategy::Pages));
                assert_eq!(*chunk_size, Some(300));
                assert!(!force);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.index_dir, Some(PathBuf::from("/tmp/idx")));
    }

    #[test]
    fn test_parse_search_defaults() {
        let args = Args::try_parse_from(["temis-retriever", "search", "cartão corporativo"]).unwrap();
        match args.command {
            Command::Search { query, k, json } => {
                assert_eq!(query, "cartão corporativo");
                assert_eq!(k, 5);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_overrides_apply() {
        let args = Args::try_parse_from([
            "temis-retriever",
            "status",
            "--config",
            "/nonexistent.toml",
        ])
        .unwrap();
        assert!(args.resolve_config().is_err());

        let args = Args::try_parse_from([
            "temis-retriever",
            "status",
            "--model",
            "minilm",
            "--ollama-url",
            "http://ollama:11434",
        ])
        .unwrap();
        let config = args.resolve_config().unwrap();
        assert_eq!(config.embedder.model, "minilm");
        assert_eq!(config.embedder.endpoint.as_deref(), Some("http://ollama:11434"));
    }
}
