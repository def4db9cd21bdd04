//! Domain layer for the Pool Manager

pub mod events;
pub mod pool;
pub mod state;

pub use events::BatchClosed;
pub use pool::{PendingQueue, Pool};
pub use state::{BatchPhase, BatchState, BatchStateWord, InFlightTracker};
