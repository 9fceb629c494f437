//! System limits and configuration bounds.
//!
//! Following TigerStyle: put limits on everything.
//! Every table and cache held by the sharding context has an explicit maximum.

/// System-wide limits for the sharding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    // Topology limits.
    /// Maximum number of shards tracked by the shard registry.
    pub max_shards: u32,

    // Catalog cache limits.
    /// Maximum number of databases held in the catalog cache.
    pub max_catalog_cache_entries: u32,

    // Cursor limits.
    /// Maximum number of open router cursors.
    pub max_cursors: u32,
    /// Idle time after which an unpinned cursor is reaped, in microseconds.
    pub cursor_idle_timeout_us: u64,
}

impl Limits {
    /// Creates limits with safe defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            // Topology: 1024 shards.
            max_shards: 1024,

            // Catalog cache: 10k databases.
            max_catalog_cache_entries: 10_000,

            // Cursors: 100k open, 10 minute idle timeout.
            max_cursors: 100_000,
            cursor_idle_timeout_us: 10 * 60 * 1_000_000,
        }
    }

    /// Validates that all limits are internally consistent.
    ///
    /// # Errors
    /// Returns an error if any limit is zero.
    pub const fn validate(&self) -> crate::Result<()> {
        if self.max_shards == 0 {
            return Err(crate::Error::InvalidArgument {
                name: "max_shards",
                reason: "must be positive",
            });
        }

        if self.max_catalog_cache_entries == 0 {
            return Err(crate::Error::InvalidArgument {
                name: "max_catalog_cache_entries",
                reason: "must be positive",
            });
        }

        if self.max_cursors == 0 {
            return Err(crate::Error::InvalidArgument {
                name: "max_cursors",
                reason: "must be positive",
            });
        }

        if self.cursor_idle_timeout_us == 0 {
            return Err(crate::Error::InvalidArgument {
                name: "cursor_idle_timeout_us",
                reason: "must be positive",
            });
        }

        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}
