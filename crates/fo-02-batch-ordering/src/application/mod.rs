//! Application layer for Batch Ordering

pub mod service;

pub use service::BatchOrderingEngine;
