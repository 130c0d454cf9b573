//! Dataset generation and I/O errors.

use std::path::PathBuf;

use radar_core::ValidationError;
use thiserror::Error;

/// Errors from generating, exporting and loading datasets.
#[derive(Error, Debug)]
pub enum SynthError {
    /// Generator configuration is unusable.
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    /// Filesystem error on a dataset file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON file could not be written or parsed.
    #[error("JSON error in {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A CSV file could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A loaded record failed validation.
    #[error("{file} record {index} is invalid: {source}")]
    Invalid {
        /// File the record came from.
        file: &'static str,
        /// Zero-based position in the file.
        index: usize,
        /// Validation failure.
        #[source]
        source: ValidationError,
    },

    /// Directory holds none of the dataset files.
    #[error("{0} does not contain a PolicyRadar dataset")]
    NotADataset(PathBuf),
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
