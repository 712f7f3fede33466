//! Error types for word-space queries

use thiserror::Error;

/// Result type alias for word-space operations
pub type Result<T> = std::result::Result<T, WordSpaceError>;

/// Error types that can occur while querying a word space
#[derive(Error, Debug)]
pub enum WordSpaceError {
    #[error("Word not found: {word}")]
    WordNotFound { word: String },

    #[error("Malformed record for {word:?}: {reason}")]
    MalformedRecord { word: String, reason: String },

    #[error("Composition needs at least two vectors, got {count}")]
    InsufficientOperands { count: usize },

    #[error("Word space unavailable at {path}: {reason}")]
    StoreUnavailable { path: String, reason: String },

    #[error("Cannot parse query {query:?}: {reason}")]
    QueryParse { query: String, reason: String },

    #[error("Unsupported similarity measure: {0}")]
    UnsupportedMeasure(String),

    #[error("Unsupported composition method: {0}")]
    UnsupportedMethod(String),

    #[error("Relation position out of range (1-6): {0}")]
    InvalidRelation(u8),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl WordSpaceError {
    pub(crate) fn malformed(word: impl Into<String>, reason: impl Into<String>) -> Self {
        WordSpaceError::MalformedRecord {
            word: word.into(),
            reason: reason.into(),
        }
    }
}
