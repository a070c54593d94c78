use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("search index is not ready yet")]
    NotReady,

    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("corrupt index artifact: {0}")]
    CorruptArtifact(String),

    #[error("embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stable error classification exposed to callers that relay failures
/// upstream without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidQuery,
    NotReady,
    ProviderUnavailable,
    MalformedResponse,
    CorruptArtifact,
    DimensionMismatch,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidQuery => "invalid_query",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::ProviderUnavailable => "provider_unavailable",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::CorruptArtifact => "corrupt_artifact",
            ErrorKind::DimensionMismatch => "dimension_mismatch",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }

    /// Kinds that may clear up on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotReady
                | ErrorKind::ProviderUnavailable
                | ErrorKind::CorruptArtifact
                | ErrorKind::Io
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Error::NotReady => ErrorKind::NotReady,
            Error::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            Error::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Error::CorruptArtifact(_) => ErrorKind::CorruptArtifact,
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}
