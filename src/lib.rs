//! Semantic retrieval for RAG pipelines: chunk documents, embed them through
//! an Ollama-compatible provider, publish a flat L2 index with aligned
//! metadata, and serve k-NN search over HTTP once the index is ready.

pub mod cli;
pub mod config;
pub mod error;
pub mod scan;
pub mod search;
pub mod server;

pub use error::{Error, ErrorKind, Result};
