pub mod chunker;
pub mod embedder;
pub mod indexer;
pub mod loader;
pub mod searcher;
pub mod store;

pub use chunker::{ChunkStrategy, Chunker, SourceDocument};
pub use embedder::{
    create_embedder, Embedder, EmbedderConfig, EmbeddingClient, EmbeddingModel, OllamaEmbedder,
};
pub use indexer::{BuiltIndex, IndexResult, Indexer};
pub use loader::{IndexLoader, LoaderConfig, PollPolicy, Sleeper, TokioSleeper};
pub use searcher::{Searcher, DEFAULT_MAX_K};
pub use store::{
    ArtifactPaths, Chunk, FlatIndex, GenerationContext, IndexSnapshot, IndexStore, Manifest,
    Neighbor, ReadyState, ResultMetadata, SearchResult,
};
