//! # FO-03: Result Store Subsystem
//!
//! Durable per-transaction ordering outcomes and rolling per-pool metrics.
//!
//! ## Architecture
//!
//! - **Domain**: Stored record format, incremental metrics, errors
//! - **Ports**: Inbound (`ResultStoreApi`) and Outbound (`KeyValueStore`)
//! - **Adapters**: `InMemoryKVStore`
//! - **Service**: `ResultStore`, `sweep_task`
//!
//! Results are bincode-encoded under `result/<transaction id>` and are
//! write-once. Eviction is a background sweep over the result prefix.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::memory::InMemoryKVStore;
pub use config::ResultStoreConfig;
pub use domain::errors::{KVStoreError, StoreError};
pub use ports::inbound::ResultStoreApi;
pub use ports::outbound::{BatchOperation, KeyValueStore};
pub use service::{sweep_task, ResultStore};
