//! Grid Context - the process-wide sharding context.
//!
//! [`SharedContext`] holds the long-lived router subsystems (catalog cache,
//! shard registry, cursor manager) plus one swappable member: the active
//! [`CatalogManager`](grid_catalog::CatalogManager). The catalog manager is
//! replaced at most once per process, when the config servers migrate from
//! the legacy mirrored protocol to a replicated consensus set.
//!
//! # Access Protocol
//!
//! Readers never hold the catalog manager directly. They call
//! [`SharedContext::access_catalog_manager`] and receive a
//! [`CatalogManagerGuard`] that pins the manager for its own scope:
//!
//! ```ignore
//! let catalog = context.access_catalog_manager(&op).await;
//! let settings = catalog.get_balancer_settings(&op).await?;
//! // Guard dropped here; a pending swap may now proceed.
//! ```
//!
//! A task holding a guard must not request another one, directly or through
//! a helper. Readers queue behind a pending swap, and the swap waits for the
//! held guard. Helpers that need the manager have `*_with` variants taking
//! the guard the caller already holds.
//!
//! The swap path holds a writer mutex for its entire duration (so two swaps
//! never interleave with each other or with the compatibility check) and
//! takes the reader/writer lock exclusively only to replace the manager.
//! The retired manager is shut down after both locks are released.
//!
//! # Modes
//!
//! Legacy to consensus is the only permitted transition. Consensus back to
//! legacy is rejected with [`ContextError::IncompatibleCatalogManager`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod balancer;
mod config;
mod context;
mod error;
mod guard;
mod swap_cell;
mod transition;

pub use balancer::should_balance;
pub use config::GridConfig;
pub use context::SharedContext;
pub use error::{ContextError, ContextResult};
pub use guard::CatalogManagerGuard;
pub use swap_cell::{SwapCell, SwapExclusive, SwapGuard, SwapWriter};
pub use transition::{evaluate_transition, SwapDecision, SwapOutcome};
