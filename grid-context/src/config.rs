//! Sharding context configuration.

use grid_core::Limits;
use grid_routing::CatalogCacheConfig;

use crate::error::ContextResult;

/// Configuration for a [`SharedContext`](crate::SharedContext).
#[derive(Debug, Clone, Copy)]
pub struct GridConfig {
    /// Initial value of the allow-local-host flag.
    pub allow_local_host: bool,
    /// Catalog cache sizing.
    pub catalog_cache: CatalogCacheConfig,
}

impl GridConfig {
    /// Creates config from validated system limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `limits` fail validation.
    pub fn from_limits(limits: &Limits) -> ContextResult<Self> {
        limits.validate()?;
        Ok(Self {
            allow_local_host: false,
            catalog_cache: CatalogCacheConfig::from_limits(limits),
        })
    }

    /// Creates config for testing: local hosts allowed, small cache.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            allow_local_host: true,
            catalog_cache: CatalogCacheConfig { max_entries: 64 },
        }
    }

    /// Builder: set the initial allow-local-host flag.
    #[must_use]
    pub const fn with_allow_local_host(mut self, allow: bool) -> Self {
        self.allow_local_host = allow;
        self
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            allow_local_host: false,
            catalog_cache: CatalogCacheConfig::default(),
        }
    }
}
