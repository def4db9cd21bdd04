//! # Shared Types Crate
//!
//! Domain entities, pool configuration, the error taxonomy and the clock
//! abstraction used by every fair-ordering subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-subsystem types are defined here.
//! - **Immutability**: `Transaction`, `PoolConfig` and `OrderingResult` are
//!   never mutated after creation; a config update is a new version.
//! - **Injectable time**: nothing reads the wall clock directly; callers
//!   supply a `TimeSource`.

pub mod config;
pub mod entities;
pub mod errors;
pub mod time;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use time::*;
