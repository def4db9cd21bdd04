//! # FO-02: Batch Ordering Subsystem
//!
//! Pure, deterministic computation of a closed batch's execution order and
//! per-transaction fairness scores.
//!
//! ## Architecture
//!
//! - **Domain**: `Batch`, `BatchOutcome`, `Placement`, ordering invariants
//! - **Algorithms**: FIFO, PriorityFair, TimeWeighted, MevResistant, window partition
//! - **Ports**: Inbound (`BatchOrderingApi`)
//! - **Application**: `BatchOrderingEngine`
//!
//! ## Guarantees
//!
//! - Positions of the ordered transactions are a permutation of `0..n`.
//! - A transaction whose `execute_before` passed is `Expired`, never ordered.
//! - A malformed transaction fails alone; a parameter error fails the batch.

pub mod algorithms;
pub mod application;
pub mod domain;
pub mod ports;

pub use algorithms::{OrderingContext, Strategy};
pub use application::service::BatchOrderingEngine;
pub use domain::entities::*;
pub use domain::errors::OrderingError;
pub use ports::inbound::BatchOrderingApi;
