//! Outbound Ports (Driven Ports / SPI)

use crate::domain::events::BatchClosed;

/// Delivers closed-batch notifications to downstream collaborators.
///
/// Publishing never blocks the close path and never fails it; delivery
/// problems are the publisher's to log.
pub trait BatchEventPublisher: Send + Sync {
    fn publish(&self, event: BatchClosed);
}
