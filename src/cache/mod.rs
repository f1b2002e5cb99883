//! Cache Module
//!
//! Provides in-memory object caching with TTL expiration and capacity eviction.

mod entry;
mod order;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

pub(crate) use entry::CacheEntry;
pub(crate) use order::{Handle, TouchOrder};

// Re-export public types
pub use stats::CacheStats;
pub use store::ObjCache;
