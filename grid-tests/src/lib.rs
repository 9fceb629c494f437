//! Grid Tests - integration and simulation tests for the sharding context.
//!
//! ## Test Organization
//!
//! **DST Tests** (`*_dst.rs`): Seeded concurrent runs with fault injection
//! - `context_dst`: Readers, swaps and metadata operations racing on one context
//!
//! **Integration Tests** (`*_tests.rs`): Multi-component integration
//! - `context_tests`: Context lifecycle, guarded access and the migration path
//!
//! **Support Modules**:
//! - `recording_catalog`: Catalog manager that records its lifecycle events
//! - `scenarios`: Shared seeds and fixtures
//!
//! ## Naming Conventions
//!
//! - DST tests: `test_dst_<component>_<scenario>`
//! - Integration tests: `test_<component>_<scenario>`
//! - Unit tests: Inline in each crate under `#[cfg(test)]`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod recording_catalog;
pub mod scenarios;

#[cfg(test)]
mod context_dst;
