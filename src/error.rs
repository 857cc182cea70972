//! Error handling for dataset construction
//!
//! Parsing itself is best-effort and never fails on malformed content; the
//! errors here cover I/O, persistence, configuration and the few
//! preconditions that would otherwise cause unbounded work.

use thiserror::Error;

/// Main error type for the dataset pipeline
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Snapshot encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error(
        "Not enough candidate concepts for mention '{mention}': {available} available, {requested} requested"
    )]
    InsufficientConcepts {
        mention: String,
        available: usize,
        requested: usize,
    },

    #[error("Dataset snapshot version mismatch: expected {expected}, got {found}")]
    SnapshotVersion { expected: u32, found: u32 },

    #[error("Catalog manifest error: {0}")]
    Manifest(String),
}

impl DatasetError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DatasetError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for dataset operations
pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = DatasetError::invalid("test_fraction", "must be in (0, 1), got 1.5");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'test_fraction': must be in (0, 1), got 1.5"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.obo");
        let err: DatasetError = io.into();
        assert!(matches!(err, DatasetError::Io(_)));
        assert!(err.to_string().contains("missing.obo"));
    }
}
