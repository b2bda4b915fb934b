//! Error types for detbench
//!
//! Setup failures (bad config, missing dataset root) propagate to the caller.
//! Failures inside a unit of work (one annotation line, one model run) are
//! recorded as outcomes instead and never surface through this type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// detbench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Session config or dataset descriptor unusable (fatal)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No images under the resolved directory
    #[error("Empty dataset: no images found in {}\nCheck the train/val paths in the dataset descriptor", .0.display())]
    EmptyDataset(PathBuf),

    /// A single annotation line could not be decoded
    #[error("Malformed annotation {line:?}: {reason}")]
    MalformedAnnotation {
        /// Offending line, trimmed
        line: String,
        /// Human-readable cause
        reason: String,
    },

    /// Every run failed, so there is nothing to export
    #[error("No results: 0 of {attempted} runs succeeded\nCheck the dataset path, weight references and trainer setup")]
    NoResults {
        /// Number of runs attempted in the session
        attempted: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error (session config, dataset descriptor)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Shorthand for [`Error::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
