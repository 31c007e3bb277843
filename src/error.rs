//! Error types for the inquest crate

use thiserror::Error;

/// Main error type for the inquest crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("missing catalog file(s): {path}")]
    CatalogFileMissing { path: String },

    #[error("catalog has no {table}")]
    EmptyCatalog { table: String },

    #[error("duplicate {kind} id '{id}' in catalog")]
    DuplicateId { kind: &'static str, id: String },

    #[error("unknown entity '{id}'")]
    UnknownEntity { id: String },

    #[error("unknown question '{id}'")]
    UnknownQuestion { id: String },

    #[error("invalid answer '{input}'. Expected one of: {expected}")]
    ParseAnswer { input: String, expected: String },

    #[error("invalid selection mode '{input}'. Expected one of: {expected}")]
    ParseSelectionMode { input: String, expected: String },

    #[error("invalid trait category '{input}'. Expected one of: {expected}")]
    ParseCategory { input: String, expected: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("likelihood {value} must lie strictly between 0 and 1")]
    InvalidLikelihood { value: f64 },

    #[error("prior weight {value} must be non-negative and finite")]
    InvalidPrior { value: f64 },

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshotVersion { found: u32, expected: u32 },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("no snapshot stored at '{path}'")]
    SnapshotMissing { path: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
