//! Adapters for the Result Store

pub mod memory;

pub use memory::InMemoryKVStore;
