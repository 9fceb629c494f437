//! Grid router node.
//!
//! Wires a [`SharedContext`](grid_context::SharedContext) into a running
//! router: startup, the one-way config server migration, and the periodic
//! maintenance task.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod router;
mod tasks;

pub use error::{ServerError, ServerResult};
pub use router::{current_time_us, Router};
pub use tasks::{maintenance_task, MaintenanceConfig};
