//! Ports layer for the Pool Manager

pub mod inbound;
pub mod outbound;

pub use inbound::FairOrderingApi;
pub use outbound::BatchEventPublisher;
