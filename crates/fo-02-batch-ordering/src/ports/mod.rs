//! Ports layer for Batch Ordering

pub mod inbound;

pub use inbound::BatchOrderingApi;
