//! Configuration loading errors.

use std::path::PathBuf;

use tagconf_core::DecodeErrors;
use thiserror::Error;

/// Result type alias for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading a configuration document.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error.
    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The top level of the document is not a mapping.
    #[error("configuration document must be a mapping, found {found}")]
    NotAMapping {
        /// Structural type of the top-level node.
        found: &'static str,
    },

    /// The document format could not be determined or is not supported.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// The document was parsed but did not fill the record cleanly.
    #[error("invalid configuration:\n{0}")]
    Decode(#[from] DecodeErrors),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a new not-a-mapping error.
    pub fn not_a_mapping(found: &'static str) -> Self {
        Self::NotAMapping { found }
    }

    /// Create a new unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// The field-level failures, if the document itself was well formed.
    pub fn decode_errors(&self) -> Option<&DecodeErrors> {
        match self {
            Self::Decode(errors) => Some(errors),
            _ => None,
        }
    }
}
