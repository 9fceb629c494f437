//! Error types for grid core operations.

use std::fmt;

/// The result type for grid core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in grid core operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An invalid argument was provided.
    InvalidArgument {
        /// The name of the argument.
        name: &'static str,
        /// Why it was invalid.
        reason: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { name, reason } => {
                write!(f, "invalid argument '{name}': {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}
