//! Sharding context error types.

use grid_catalog::{CatalogError, ConfigServerMode};
use grid_routing::RoutingError;
use thiserror::Error;

/// Result type for sharding context operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors returned by the sharding context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The requested catalog manager transition is not supported.
    #[error("incompatible catalog manager: cannot move from {current} to {desired}, downgrade is not supported")]
    IncompatibleCatalogManager {
        /// Mode of the active catalog manager.
        current: ConfigServerMode,
        /// Mode that was requested.
        desired: ConfigServerMode,
    },

    /// A catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A routing subsystem operation failed.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Limits or configuration were invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] grid_core::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_display() {
        let err = ContextError::IncompatibleCatalogManager {
            current: ConfigServerMode::Consensus,
            desired: ConfigServerMode::Legacy,
        };
        let msg = err.to_string();
        assert!(msg.contains("CSRS"));
        assert!(msg.contains("SCCC"));
        assert!(msg.contains("downgrade"));
    }

    #[test]
    fn test_catalog_error_is_transparent() {
        let inner = CatalogError::DatabaseNotFound {
            name: "orders".into(),
        };
        let err = ContextError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}
