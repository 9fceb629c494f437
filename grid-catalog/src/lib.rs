//! Catalog manager capability surface for the sharding context.
//!
//! The catalog manager owns cluster metadata: databases, shards and the
//! balancer settings document. The sharding context treats it as an opaque
//! collaborator and only consumes the operations declared by
//! [`CatalogManager`].
//!
//! # Config Server Modes
//!
//! Two protocol flavors exist:
//!
//! - **Legacy** (`SCCC`): three mirrored config servers without consensus.
//! - **Consensus** (`CSRS`): a replicated config server set.
//!
//! A node migrates from legacy to consensus at most once. The reverse
//! direction is never allowed.
//!
//! # Testing
//!
//! [`SimulatedCatalogManager`] keeps metadata in memory and supports
//! deterministic fault injection:
//!
//! ```ignore
//! use grid_catalog::{CatalogFaultConfig, ConfigServerMode, SimulatedCatalogManager};
//!
//! let legacy = SimulatedCatalogManager::with_faults(
//!     42,
//!     ConfigServerMode::Legacy,
//!     CatalogFaultConfig::flaky(),
//! );
//! // Same metadata, new protocol.
//! let consensus = legacy.with_mode(ConfigServerMode::Consensus);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod manager;
mod simulated;
mod types;

pub use error::{CatalogError, CatalogResult};
pub use manager::CatalogManager;
pub use simulated::{CatalogFaultConfig, SimulatedCatalogManager};
pub use types::{
    minute_of_day, ActiveWindow, BalancerSettings, ConfigServerMode, DatabaseType, ShardType,
    MINUTES_PER_DAY,
};
