//! Error types for cache configuration
//!
//! Cache operations themselves are infallible; only loading or validating a
//! configuration can fail.

use thiserror::Error;

// == Config Error Enum ==
/// Errors raised while building or validating a [`Config`](crate::Config).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },

    /// The entry limit must allow at least one entry
    #[error("Entry limit must be greater than zero")]
    ZeroEntryLimit,

    /// The default expiration must be a non-zero duration
    #[error("Default expiration must be greater than zero")]
    ZeroExpiration,
}

// == Refresh Policy Parse Error ==
/// A refresh policy name other than `reposition` or `replace`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown refresh policy {0:?}, expected \"reposition\" or \"replace\"")]
pub struct ParseRefreshPolicyError(pub String);

// == Result Type Alias ==
/// Convenience Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
