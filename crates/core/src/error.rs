//! Error types shared by the matcher and the per-file readers.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to extract text from {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },
    #[error("corpus is empty: no readable documents with indexable terms")]
    EmptyCorpus,
    #[error("query has no terms in the corpus vocabulary")]
    EmptyQuery,
    #[error("invalid job description: {0}")]
    InvalidQueryFormat(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cache bundle is inconsistent: {0}")]
    CacheCorruption(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Per-file failure raised by a document reader.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {path:?}: {message}")]
    Failed { path: PathBuf, message: String },
}

impl ExtractionError {
    pub fn failed(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        ExtractionError::Failed {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl From<ExtractionError> for MatchError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFormat(ext) => MatchError::UnsupportedFormat(ext),
            ExtractionError::Failed { path, message } => MatchError::Extraction { path, message },
        }
    }
}
