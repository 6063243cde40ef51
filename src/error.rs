//! Error types for the jiten engine.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! distinguishes the failure classes that callers handle differently:
//! I/O problems, checksum mismatches (which cache readers treat as a miss,
//! not a failure), unparseable dictionary sources, query syntax errors, and
//! cancellation (an expected terminal state, not a failure).

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T, E = JitenError> = std::result::Result<T, E>;

/// Errors produced by the dictionary engine.
#[derive(Debug, thiserror::Error)]
pub enum JitenError {
    /// Filesystem read or write failure while touching a dictionary or cache file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cache artifact exists but was written for different source content.
    ///
    /// Cache readers convert this into a cache miss; it only surfaces as an
    /// error from explicit validation entry points.
    #[error("checksum mismatch for {path}: expected {expected}, found {found}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// The dictionary source is not recognizable as the expected format.
    ///
    /// Individual malformed lines degrade to best-effort parsing and do not
    /// produce this error; it is reserved for input that cannot be treated
    /// as the format at all (for example, bytes that are not UTF-8 text).
    #[error("parse error in {name}: {message}")]
    Parse { name: String, message: String },

    /// A query string contains an unbalanced parenthesis.
    #[error("unmatched parenthesis at byte {position} in query {query:?}")]
    UnmatchedParenthesis { query: String, position: usize },

    /// The search was cancelled before it finished.
    ///
    /// Partial results accumulated before cancellation remain available.
    #[error("search was cancelled")]
    Cancelled,

    /// Serialization or deserialization of a cache artifact failed.
    #[error(transparent)]
    Serialize(#[from] rkyv::rancor::Error),

    /// A temporary cache file could not be moved into place.
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),

    /// An operation was invoked in a state that does not permit it,
    /// such as starting a search twice.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The background search worker panicked.
    #[error("search worker panicked: {0}")]
    WorkerPanic(String),
}

impl JitenError {
    /// Builds a [`JitenError::Parse`] from a dictionary name and message.
    pub(crate) fn parse<N, M>(name: N, message: M) -> Self
    where
        N: Into<String>,
        M: Into<String>,
    {
        Self::Parse {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether this error represents cancellation rather than a real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
