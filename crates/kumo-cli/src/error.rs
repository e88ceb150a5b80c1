//! Error types for the command line front end.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that stop a command before it can report results.
#[derive(Debug, Error)]
pub enum CliError {
    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Engine settings read from the environment or flags are malformed.
    #[error(transparent)]
    EngineConfig(#[from] kumo::config::ConfigError),

    /// A path given on the command line could not be walked.
    #[error("failed to search {path}: {source}")]
    Discovery {
        /// Root of the search.
        path: Utf8PathBuf,
        /// Underlying walk failure.
        #[source]
        source: walkdir::Error,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    /// No feature files were found under the given paths.
    #[error("no .feature files found under {}", .0.join(", "))]
    NoFeatures(Vec<String>),

    /// Reading a document or writing output failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The engine rejected the documents or the run.
    #[error(transparent)]
    Engine(#[from] kumo::RunError),

    /// Serializing a plan or result tree failed.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}
