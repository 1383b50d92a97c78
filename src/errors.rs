//! Error types for agent-kdb.

use thiserror::Error;

/// Main error type for agent-kdb operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The embedding function rejected or failed on its input.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Tokenization error.
    #[error("Tokenization error: {0}")]
    Tokenization(#[from] tokenizers::Error),

    /// ONNX session error.
    #[error("ONNX session error: {0}")]
    Onnx(#[from] ort::Error),

    /// HuggingFace Hub error.
    #[error("HuggingFace Hub error: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),

    /// Backing store failure (SQLite, corrupted rows, collection mismatch).
    /// The payload is [`StorageError`](crate::StorageError).
    #[error("Storage error: {0}")]
    Storage(#[from] crate::sqlite::Error),

    /// A fragment with this identifier already exists and the store rejects duplicates.
    #[error("Identifier collision: fragment {0} already exists")]
    IdentifierCollision(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Fragment not found.
    #[error("Fragment not found: {0}")]
    NotFound(String),

    /// The external agent failed to produce a reply.
    #[error("Agent error: {0}")]
    Agent(String),
}

/// Coarse classification of [`Error`] for callers that only need to branch
/// on the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Embedding,
    Storage,
    IdentifierCollision,
    Input,
    Config,
    NotFound,
    Agent,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Embedding(_) | Error::Tokenization(_) | Error::Onnx(_) | Error::HfHub(_) => {
                ErrorKind::Embedding
            }
            Error::Storage(_) | Error::Io(_) | Error::Json(_) => ErrorKind::Storage,
            Error::IdentifierCollision(_) => ErrorKind::IdentifierCollision,
            Error::InvalidInput(_) => ErrorKind::Input,
            Error::Config(_) => ErrorKind::Config,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Agent(_) => ErrorKind::Agent,
        }
    }
}
