// Module declarations
pub mod persistence;
pub mod seed;

// Re-export all implementations
pub use persistence::{IdPolicy, InMemoryRecordStore, ParseIdPolicyError};
