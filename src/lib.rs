//! ObjCache - An in-process object cache
//!
//! Provides a thread-safe key/value store with per-entry TTL expiration and
//! a hard capacity ceiling. All eviction is lazy: there is no background task.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, ObjCache};
pub use config::{Config, RefreshPolicy};
pub use error::{ConfigError, ParseRefreshPolicyError};
