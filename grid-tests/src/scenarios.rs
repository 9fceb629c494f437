//! Reusable fixtures for sharding context tests.

use grid_catalog::{ConfigServerMode, ShardType, SimulatedCatalogManager};
use grid_context::{GridConfig, SharedContext};
use grid_core::{OpId, OperationContext, ShardId};
use grid_routing::{ClusterCursorManager, CursorManagerConfig, ShardRegistry};

/// Seeds for reproducible testing.
pub mod seeds {
    /// Standard test seeds that have historically found bugs.
    pub const REGRESSION_SEEDS: &[u64] = &[
        42,
        12345,
        0xDEAD_BEEF,
        999,
        7777,
        0x1337,
        0xCAFE_BABE,
        1,
        u64::MAX,
        0,
    ];
}

/// Hosts for a small non-local cluster.
pub const THREE_SHARDS: &[(u64, &str)] = &[
    (1, "shard1.example.net:27018"),
    (2, "shard2.example.net:27018"),
    (3, "shard3.example.net:27018"),
];

/// Returns an operation context with the given id, started at time zero.
#[must_use]
pub const fn op(id: u64) -> OperationContext {
    OperationContext::new(OpId::new(id), 0)
}

/// Returns a simulated legacy catalog holding [`THREE_SHARDS`].
#[must_use]
pub fn legacy_catalog(seed: u64) -> SimulatedCatalogManager {
    let catalog = SimulatedCatalogManager::new(seed, ConfigServerMode::Legacy);
    for (id, host) in THREE_SHARDS {
        catalog.add_shard(ShardType::new(ShardId::new(*id), *host));
    }
    catalog
}

/// Returns a context initialized with `catalog` and test-sized collaborators.
#[must_use]
pub fn initialized_context(catalog: &SimulatedCatalogManager) -> SharedContext {
    let context = SharedContext::new(GridConfig::for_testing());
    context.init(
        Box::new(catalog.clone()),
        ShardRegistry::default(),
        ClusterCursorManager::new(CursorManagerConfig::for_testing()),
    );
    context
}
