//! Grid Routing - Long-lived router subsystems.
//!
//! This crate provides the collaborators the sharding context constructs once
//! at startup and never replaces: the catalog cache, the shard registry and
//! the cluster cursor manager.
//!
//! # Design (`TigerStyle`)
//!
//! - **Bounded**: Every table has an explicit maximum size
//! - **Explicit time**: Idle tracking takes `current_time_us` from the caller
//! - **Shared by reference**: All operations take `&self` and synchronize internally

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod catalog_cache;
mod cursor_manager;
mod error;
mod shard_registry;

pub use catalog_cache::{CatalogCache, CatalogCacheConfig};
pub use cursor_manager::{ClusterCursorManager, CursorManagerConfig, CursorStats};
pub use error::{RoutingError, RoutingResult};
pub use shard_registry::{is_local_host, ShardRegistry, ShardRegistryConfig};
