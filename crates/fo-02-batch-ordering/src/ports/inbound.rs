//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{Batch, BatchOutcome};

/// Computes the outcome of one closed batch.
///
/// Deterministic: the same batch contents and config always produce the
/// same outcome. Never fails as a call; a batch-wide failure is reported
/// inside the outcome with every transaction marked `Failed`.
pub trait BatchOrderingApi: Send + Sync {
    fn order(&self, batch: Batch) -> BatchOutcome;
}
