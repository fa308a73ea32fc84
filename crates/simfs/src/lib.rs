#![forbid(unsafe_code)]
//! SimFS public API facade.
//!
//! Re-exports the simulation engine from `simfs-core` through a stable
//! external interface. Downstream consumers (the CLI, embedding
//! services) depend on this crate.

pub use simfs_core::*;
