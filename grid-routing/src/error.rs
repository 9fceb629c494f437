//! Routing subsystem errors.

use grid_core::{CursorId, ShardId};

/// Result type for routing subsystem operations.
pub type RoutingResult<T> = Result<T, RoutingError>;

/// Errors from shard registry and cursor manager operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Too many shards.
    TooManyShards {
        /// Requested count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A local host address was offered while local hosts are disallowed.
    LocalHostNotAllowed {
        /// The rejected host.
        host: String,
    },
    /// Local and non-local shard hosts cannot be mixed.
    MixedLocalHost {
        /// The rejected host.
        host: String,
    },
    /// Shard not found.
    ShardNotFound {
        /// The missing shard.
        shard_id: ShardId,
    },
    /// Too many open cursors.
    TooManyCursors {
        /// Current count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Cursor not found.
    CursorNotFound {
        /// The missing cursor.
        cursor_id: CursorId,
    },
    /// Cursor is already checked out.
    CursorInUse {
        /// The pinned cursor.
        cursor_id: CursorId,
    },
    /// Cursor was checked in without being checked out.
    CursorNotPinned {
        /// The idle cursor.
        cursor_id: CursorId,
    },
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyShards { count, max } => {
                write!(f, "too many shards: {count} (max {max})")
            }
            Self::LocalHostNotAllowed { host } => {
                write!(f, "local host address not allowed for shard: {host}")
            }
            Self::MixedLocalHost { host } => {
                write!(
                    f,
                    "cannot mix local and non-local shard hosts: {host}"
                )
            }
            Self::ShardNotFound { shard_id } => write!(f, "shard not found: {shard_id}"),
            Self::TooManyCursors { count, max } => {
                write!(f, "too many cursors: {count} (max {max})")
            }
            Self::CursorNotFound { cursor_id } => write!(f, "cursor not found: {cursor_id}"),
            Self::CursorInUse { cursor_id } => write!(f, "cursor in use: {cursor_id}"),
            Self::CursorNotPinned { cursor_id } => {
                write!(f, "cursor not checked out: {cursor_id}")
            }
        }
    }
}

impl std::error::Error for RoutingError {}
