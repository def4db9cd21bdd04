//! Adapters for the Pool Manager

pub mod publisher;

pub use publisher::BroadcastPublisher;
