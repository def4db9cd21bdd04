//! # FO-04: Pool Manager Subsystem
//!
//! Fairness pools and their batch lifecycle: submission, cancellation,
//! size and timeout triggered closes, and hand-off of closed batches to the
//! ordering engine and result store.
//!
//! ## Architecture
//!
//! - **Domain**: `Pool`, `PendingQueue`, the batch state word, `BatchClosed`
//! - **Ports**: Inbound (`FairOrderingApi`) and Outbound (`BatchEventPublisher`)
//! - **Adapters**: `BroadcastPublisher`
//! - **Service**: `PoolManager`
//!
//! ## Batch lifecycle
//!
//! ```text
//! Open(n) --size or timeout--> Closing(n) --ordered + stored--> Open(n + 1)
//! ```
//!
//! The Open -> Closing step is one compare-and-swap per pool; concurrent
//! triggers produce exactly one close. Submissions arriving while a batch
//! is closing join the next one.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::BroadcastPublisher;
pub use config::{ManagerConfig, SchedulerConfig};
pub use domain::{BatchClosed, BatchPhase, BatchState};
pub use ports::{BatchEventPublisher, FairOrderingApi};
pub use service::PoolManager;
