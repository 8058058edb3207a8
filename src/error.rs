//! Error types shared across the embedding and search layers.

use std::path::PathBuf;

/// Errors surfaced by the embedding and similarity-search components.
///
/// Every failure leaves the component it came from in a safe, reusable
/// state; nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A model or vocabulary file did not match its expected layout,
    /// or an embedding had the wrong dimension.
    #[error("format error: {0}")]
    Format(String),

    /// An operation was invoked before the required initialization.
    #[error("invalid state: {0}")]
    State(&'static str),

    /// The external inference engine failed or returned no usable output.
    #[error("inference error: {0}")]
    Inference(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
