//! Server error types.

use grid_context::ContextError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Shard specification could not be used.
    #[error("invalid shard {spec}: {reason}")]
    InvalidShard {
        /// The shard specification as given.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Sharding context error.
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
