//! Error types for seqlist

use std::fmt;

/// Result type alias for sequence operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sequence operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Handle does not refer to a live node of this list
    InvalidHandle,

    /// Endpoint queried on an empty list
    EmptySequence,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidHandle => write!(f, "Invalid handle: node is not part of this list"),
            Error::EmptySequence => write!(f, "Sequence is empty"),
        }
    }
}

impl std::error::Error for Error {}
