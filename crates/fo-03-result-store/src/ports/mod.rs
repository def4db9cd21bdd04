//! Ports layer for the Result Store

pub mod inbound;
pub mod outbound;

pub use inbound::ResultStoreApi;
pub use outbound::{BatchOperation, KeyValueStore};
