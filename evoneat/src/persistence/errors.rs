use thiserror::Error;

use std::io;
use std::path::PathBuf;

/// An error saving or loading a checkpoint.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The underlying storage failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The checkpoint is malformed, or of an unsupported version.
    #[error("invalid checkpoint: {0}")]
    Schema(String),
    /// The checkpoint could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
    /// The checkpoint was written by a different codec.
    #[error("checkpoint written with codec {found:?}, expected {expected:?}")]
    UnsupportedCodec { found: String, expected: String },
    /// No checkpoint exists for the requested generation.
    #[error("no checkpoint for generation {0}")]
    MissingGeneration(usize),
    /// No checkpoint exists at all.
    #[error("no checkpoints were saved")]
    Empty,
}

impl PersistenceError {
    /// Returns `true` if the error originates in the storage layer.
    pub fn is_io(&self) -> bool {
        matches!(self, PersistenceError::Io { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}
