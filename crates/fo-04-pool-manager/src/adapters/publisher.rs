//! Broadcast-channel event publisher.

use crate::domain::events::BatchClosed;
use crate::ports::outbound::BatchEventPublisher;
use tokio::sync::broadcast;
use tracing::trace;

/// Fans closed-batch events out to any number of subscribers.
///
/// Slow subscribers lag and lose the oldest events; the close path is
/// never held up.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<BatchClosed>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchClosed> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl BatchEventPublisher for BroadcastPublisher {
    fn publish(&self, event: BatchClosed) {
        let batch_id = event.batch_id;
        // No subscribers is not an error
        if self.sender.send(event).is_err() {
            trace!(batch_id, "No subscribers for BatchClosed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fo_02_batch_ordering::CloseReason;
    use shared_types::PoolId;

    fn event(batch_id: u64) -> BatchClosed {
        BatchClosed {
            pool_id: PoolId::from("p"),
            batch_id,
            close_reason: CloseReason::TimeoutElapsed,
            closed_at: 10,
            config_version: 1,
            ordered: Vec::new(),
            expired: 0,
            deferred: 0,
            redeferred: 0,
            failed: false,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        publisher.publish(event(3));
        assert_eq!(rx.recv().await.unwrap().batch_id, 3);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        BroadcastPublisher::new(1).publish(event(0));
    }
}
