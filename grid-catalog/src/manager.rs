//! The catalog manager trait.

use std::fmt::Debug;

use async_trait::async_trait;
use grid_core::OperationContext;

use crate::error::CatalogResult;
use crate::types::{BalancerSettings, ConfigServerMode, DatabaseType, ShardType};

/// Read/write access to cluster metadata held by the config servers.
///
/// Every metadata operation is a remote call and may fail with a
/// connectivity or consistency error. Implementations do their own retries;
/// callers propagate failures unchanged.
#[async_trait]
pub trait CatalogManager: Send + Sync + Debug {
    /// Returns the config server protocol this implementation speaks.
    fn mode(&self) -> ConfigServerMode;

    /// Fetches the balancer settings document.
    ///
    /// Returns `None` if no settings document exists.
    async fn get_balancer_settings(
        &self,
        op: &OperationContext,
    ) -> CatalogResult<Option<BalancerSettings>>;

    /// Fetches a database entry.
    ///
    /// Returns `None` if the database does not exist.
    async fn get_database(
        &self,
        op: &OperationContext,
        name: &str,
    ) -> CatalogResult<Option<DatabaseType>>;

    /// Creates an unsharded database, choosing its primary shard.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseExists` if the database is already present and
    /// `NoShards` if no shard can host it.
    async fn create_database(
        &self,
        op: &OperationContext,
        name: &str,
    ) -> CatalogResult<DatabaseType>;

    /// Fetches every shard entry.
    async fn get_all_shards(&self, op: &OperationContext) -> CatalogResult<Vec<ShardType>>;

    /// Releases resources held by a retired manager.
    ///
    /// Called once, after the manager has been swapped out and no reader can
    /// observe it any longer.
    async fn shut_down(&self) {}
}
