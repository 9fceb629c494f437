//! Shard registry - the router's view of cluster topology.
//!
//! The registry maps shard identifiers to connection hosts. It is refreshed
//! wholesale from catalog data and grown one shard at a time when a shard is
//! added through this node.

use std::collections::BTreeMap;

use grid_catalog::ShardType;
use grid_core::{Limits, ShardId};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{RoutingError, RoutingResult};

/// Configuration for the shard registry.
#[derive(Debug, Clone, Copy)]
pub struct ShardRegistryConfig {
    /// Maximum number of shards.
    pub max_shards: usize,
}

impl ShardRegistryConfig {
    /// Creates config from system limits.
    #[must_use]
    pub const fn from_limits(limits: &Limits) -> Self {
        Self {
            max_shards: limits.max_shards as usize,
        }
    }
}

impl Default for ShardRegistryConfig {
    fn default() -> Self {
        Self::from_limits(&Limits::new())
    }
}

/// Returns true if `host` (optionally `host:port`) names the local machine.
#[must_use]
pub fn is_local_host(host: &str) -> bool {
    let name = host_name(host);
    name.eq_ignore_ascii_case("localhost") || name.starts_with("127.") || name == "::1"
}

/// Strips the port from `host:port`, `[v6]:port` and bare addresses.
fn host_name(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        // A second colon means a bare IPv6 address, not a port.
        Some((name, _)) if !name.contains(':') => name,
        _ => host,
    }
}

/// Registry of known shards.
#[derive(Debug)]
pub struct ShardRegistry {
    config: ShardRegistryConfig,
    shards: RwLock<BTreeMap<ShardId, ShardType>>,
}

impl ShardRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: ShardRegistryConfig) -> Self {
        Self {
            config,
            shards: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an empty registry with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ShardRegistryConfig::default())
    }

    /// Adds or replaces a shard.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is local and `allow_local_host` is false,
    /// if the host's locality differs from the shards already registered, or
    /// if the registry is full.
    pub async fn add_shard(&self, shard: ShardType, allow_local_host: bool) -> RoutingResult<()> {
        let local = is_local_host(&shard.host);
        if local && !allow_local_host {
            return Err(RoutingError::LocalHostNotAllowed { host: shard.host });
        }

        let mut shards = self.shards.write().await;
        if shards
            .values()
            .any(|existing| existing.id != shard.id && is_local_host(&existing.host) != local)
        {
            return Err(RoutingError::MixedLocalHost { host: shard.host });
        }

        if shards.len() >= self.config.max_shards && !shards.contains_key(&shard.id) {
            return Err(RoutingError::TooManyShards {
                count: shards.len() + 1,
                max: self.config.max_shards,
            });
        }

        debug!(shard_id = %shard.id, host = %shard.host, "Registered shard");
        shards.insert(shard.id, shard);
        Ok(())
    }

    /// Replaces the registry contents with `shards`.
    ///
    /// Returns the number of shards now registered.
    ///
    /// # Errors
    ///
    /// Returns `TooManyShards` if `shards` exceeds the configured maximum; the
    /// registry is left unchanged.
    pub async fn reload(&self, shards: Vec<ShardType>) -> RoutingResult<usize> {
        if shards.len() > self.config.max_shards {
            return Err(RoutingError::TooManyShards {
                count: shards.len(),
                max: self.config.max_shards,
            });
        }

        let fresh: BTreeMap<ShardId, ShardType> =
            shards.into_iter().map(|shard| (shard.id, shard)).collect();
        let count = fresh.len();
        *self.shards.write().await = fresh;

        info!(shard_count = count, "Reloaded shard registry");
        Ok(count)
    }

    /// Removes a shard.
    ///
    /// # Errors
    ///
    /// Returns `ShardNotFound` if the shard is not registered.
    pub async fn remove_shard(&self, shard_id: ShardId) -> RoutingResult<ShardType> {
        self.shards
            .write()
            .await
            .remove(&shard_id)
            .ok_or(RoutingError::ShardNotFound { shard_id })
    }

    /// Returns the shard entry, if registered.
    pub async fn get_shard(&self, shard_id: ShardId) -> Option<ShardType> {
        self.shards.read().await.get(&shard_id).cloned()
    }

    /// Returns all registered shard ids in ascending order.
    pub async fn shard_ids(&self) -> Vec<ShardId> {
        self.shards.read().await.keys().copied().collect()
    }

    /// Returns the number of registered shards.
    pub async fn len(&self) -> usize {
        self.shards.read().await.len()
    }

    /// Returns true if no shard is registered.
    pub async fn is_empty(&self) -> bool {
        self.shards.read().await.is_empty()
    }
}

impl Default for ShardRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
