use crate::normalizer::Language;
use std::io;
use thiserror::Error;

/// Failures raised by a [`crate::Store`] or by the record codecs on top of it.
///
/// An absent record is not an error: lookups return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure on record {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    /// The record exists but cannot be decoded, e.g. it was truncated by a crash.
    #[error("malformed record {key}: {reason}")]
    Decode { key: String, reason: String },
    #[error("failed to encode record {key}: {reason}")]
    Encode { key: String, reason: String },
    #[error("storage backend failure: {0}")]
    Backend(#[from] sled::Error),
}

impl StoreError {
    pub fn io(key: impl ToString, source: io::Error) -> Self {
        StoreError::Io { key: key.to_string(), source }
    }

    pub fn decode(key: impl ToString, reason: impl ToString) -> Self {
        StoreError::Decode { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn encode(key: impl ToString, reason: impl ToString) -> Self {
        StoreError::Encode { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, StoreError::Decode { .. })
    }
}

/// Errors surfaced to callers that need a trained index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A required training artifact was never written.
    #[error("index artifact missing: {0} (run `indexer rebuild` first)")]
    NotBuilt(String),
    /// Queries would be normalized differently from the training text.
    #[error("normalizer does not match the index (trained {trained:?}, given {given:?})")]
    NormalizerMismatch { trained: Language, given: Language },
    #[error(transparent)]
    Store(#[from] StoreError),
}
