//! Domain layer for the Result Store

pub mod errors;
pub mod metrics;
pub mod record;

pub use errors::{KVStoreError, StoreError};
pub use record::StoredResult;
