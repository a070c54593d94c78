/// Embedding models addressable by short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingModel {
    NomicEmbedText,
    MxbaiEmbedLarge,
    AllMiniLm,
    Custom(String),
}

impl EmbeddingModel {
    /// Maps a short code or full name to a model. Unknown names pass through
    /// as [`EmbeddingModel::Custom`].
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "nomic" | "nomic-embed-text" => EmbeddingModel::NomicEmbedText,
            "mxbai" | "mxbai-embed-large" => EmbeddingModel::MxbaiEmbedLarge,
            "minilm" | "all-minilm" => EmbeddingModel::AllMiniLm,
            other => EmbeddingModel::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EmbeddingModel::NomicEmbedText => "nomic-embed-text",
            EmbeddingModel::MxbaiEmbedLarge => "mxbai-embed-large",
            EmbeddingModel::AllMiniLm => "all-minilm",
            EmbeddingModel::Custom(name) => name,
        }
    }

    pub fn known_dimensions(&self) -> Option<usize> {
        match self {
            EmbeddingModel::NomicEmbedText => Some(768),
            EmbeddingModel::MxbaiEmbedLarge => Some(1024),
            EmbeddingModel::AllMiniLm => Some(384),
            EmbeddingModel::Custom(_) => None,
        }
    }
}

impl std::fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
