//! Error types for invdict

use std::io;
use thiserror::Error;

/// Main error type for invdict
#[derive(Error, Debug)]
pub enum InvDictError {
    /// A word was offered to a word buffer that has already been closed.
    #[error("add failed because the word buffer was closed")]
    Closed,

    /// The speaker program could not be started at all.
    #[error("cannot launch speaker '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The speaker ran but exited with a non-zero, non-interrupt status.
    #[error("speaker exited with status {0}")]
    SpeakerFailure(i32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("System error: {0}")]
    Errno(#[from] nix::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for invdict operations
pub type Result<T> = std::result::Result<T, InvDictError>;

impl InvDictError {
    /// Whether this is the benign add-after-close race
    pub fn is_closed(&self) -> bool {
        matches!(self, InvDictError::Closed)
    }
}
