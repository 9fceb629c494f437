//! Catalog error types.

use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors returned by catalog manager operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The config servers could not be reached.
    #[error("config servers unreachable during {operation}: {message}")]
    Unreachable {
        /// The operation that failed.
        operation: &'static str,
        /// Error message.
        message: String,
    },

    /// The config servers returned inconsistent metadata.
    #[error("inconsistent catalog metadata during {operation}: {message}")]
    Inconsistent {
        /// The operation that failed.
        operation: &'static str,
        /// Error message.
        message: String,
    },

    /// Database does not exist.
    #[error("database not found: {name}")]
    DatabaseNotFound {
        /// The database name.
        name: String,
    },

    /// Database already exists.
    #[error("database already exists: {name}")]
    DatabaseExists {
        /// The database name.
        name: String,
    },

    /// No shard is available to become a database primary.
    #[error("no shard available to host database {name}")]
    NoShards {
        /// The database that could not be placed.
        name: String,
    },

    /// Balancer active window could not be parsed.
    #[error("invalid balancer window '{value}': {reason}")]
    InvalidWindow {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::Unreachable {
            operation: "get_balancer_settings",
            message: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("get_balancer_settings"));
        assert!(msg.contains("connection refused"));

        let err = CatalogError::DatabaseNotFound {
            name: "orders".into(),
        };
        assert_eq!(err.to_string(), "database not found: orders");
    }
}
