//! Errors raised while loading an entity model.
//!
//! Requests themselves never fail: anything the handler cannot read is
//! treated as an empty document.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// No model file at the given path.
    #[error("Model not found at '{}'", .path.display())]
    NotFound { path: PathBuf },

    /// The model file exists but could not be read.
    #[error("Failed to read model '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model file is not valid JSON or has the wrong shape.
    #[error("Failed to parse model '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A pattern in the model does not compile.
    #[error("Invalid pattern for label '{label}': {source}")]
    InvalidPattern {
        label: String,
        #[source]
        source: regex::Error,
    },

    /// A gazetteer, pattern set or name rule has a blank label.
    #[error("Entity labels must not be empty")]
    EmptyLabel,
}
