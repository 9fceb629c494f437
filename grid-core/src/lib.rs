//! Grid Core - Strongly-typed identifiers and limits for the sharding context.
//!
//! This crate provides the vocabulary shared by every other grid crate:
//! typed identifiers, the per-operation context handle, and system limits.
//!
//! # Design Principles (TigerStyle)
//!
//! - **Strongly-typed IDs**: Prevent mixing up a `ShardId` with a `CursorId`
//! - **Explicit limits**: Every collection has a bounded maximum
//! - **Explicit time**: Callers pass `current_time_us`; nothing here reads a clock
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod limits;
mod operation;
mod types;

pub use error::{Error, Result};
pub use limits::Limits;
pub use operation::OperationContext;
pub use types::{CursorId, Epoch, OpId, ShardId};
