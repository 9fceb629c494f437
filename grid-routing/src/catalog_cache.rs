//! Catalog cache - router-side cache of database entries.
//!
//! Database entries change rarely, so the router keeps them in memory and
//! only goes to the catalog manager on a miss or after an invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use grid_catalog::{CatalogError, CatalogManager, CatalogResult, DatabaseType};
use grid_core::{Limits, OperationContext};
use tokio::sync::RwLock;
use tracing::debug;

/// Configuration for the catalog cache.
#[derive(Debug, Clone, Copy)]
pub struct CatalogCacheConfig {
    /// Maximum number of cached databases.
    pub max_entries: usize,
}

impl CatalogCacheConfig {
    /// Creates config from system limits.
    #[must_use]
    pub const fn from_limits(limits: &Limits) -> Self {
        Self {
            max_entries: limits.max_catalog_cache_entries as usize,
        }
    }
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self::from_limits(&Limits::new())
    }
}

#[derive(Debug)]
struct CacheEntry {
    database: Arc<DatabaseType>,
    /// Load sequence number, used to evict the oldest load.
    loaded_seq: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
}

/// Cache of database entries keyed by name.
#[derive(Debug)]
pub struct CatalogCache {
    config: CatalogCacheConfig,
    state: RwLock<CacheState>,
}

impl CatalogCache {
    /// Creates an empty catalog cache.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_entries` is zero.
    #[must_use]
    pub fn new(config: CatalogCacheConfig) -> Self {
        assert!(config.max_entries > 0, "catalog cache must hold at least one entry");
        Self {
            config,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Returns the database entry, loading it through `catalog` on a miss.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the catalog has no such database, or the
    /// catalog's own error if the load fails.
    pub async fn get_database(
        &self,
        op: &OperationContext,
        catalog: &dyn CatalogManager,
        name: &str,
    ) -> CatalogResult<Arc<DatabaseType>> {
        if let Some(entry) = self.state.read().await.entries.get(name) {
            return Ok(Arc::clone(&entry.database));
        }

        let database = catalog
            .get_database(op, name)
            .await?
            .ok_or_else(|| CatalogError::DatabaseNotFound {
                name: name.to_string(),
            })?;

        debug!(op_id = %op.op_id(), database = name, "Loaded database into catalog cache");
        Ok(self.insert(database).await)
    }

    /// Caches `database`, replacing any existing entry with the same name.
    pub async fn insert(&self, database: DatabaseType) -> Arc<DatabaseType> {
        let mut state = self.state.write().await;

        if state.entries.len() >= self.config.max_entries
            && !state.entries.contains_key(&database.name)
        {
            Self::evict_oldest(&mut state);
        }

        let database = Arc::new(database);
        let loaded_seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            database.name.clone(),
            CacheEntry {
                database: Arc::clone(&database),
                loaded_seq,
            },
        );

        // TigerStyle: Assert postcondition.
        assert!(state.entries.len() <= self.config.max_entries);
        database
    }

    /// Drops the cached entry for `name`.
    pub async fn invalidate(&self, name: &str) {
        self.state.write().await.entries.remove(name);
    }

    /// Drops every cached entry.
    pub async fn invalidate_all(&self) {
        self.state.write().await.entries.clear();
    }

    /// Returns the number of cached entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Returns true if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    fn evict_oldest(state: &mut CacheState) {
        if let Some(oldest) = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.loaded_seq)
            .map(|(name, _)| name.clone())
        {
            state.entries.remove(&oldest);
        }
    }
}
