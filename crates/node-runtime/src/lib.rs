//! # Fair-Ordering Node Runtime
//!
//! Configuration loading and background task wiring for the fair-ordering
//! service. The binary in `main.rs` adds logging and signal handling.

pub mod config;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig};
pub use runtime::FairOrderingRuntime;
