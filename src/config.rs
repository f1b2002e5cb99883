//! Configuration Module
//!
//! The cache is configured once, at construction, from a plain value. Loading
//! that value from environment variables is provided for binaries.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, ParseRefreshPolicyError, Result};

/// Default maximum number of live entries
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default TTL applied when a caller passes a zero duration
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(300);

// == Refresh Policy ==
/// What `set` does when the key is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Move the entry to the most-recently-touched end only. The stored value
    /// and its expiry are left untouched.
    #[default]
    Reposition,
    /// Move the entry, replace its value and recompute its expiry.
    Replace,
}

impl FromStr for RefreshPolicy {
    type Err = ParseRefreshPolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reposition" => Ok(Self::Reposition),
            "replace" => Ok(Self::Replace),
            _ => Err(ParseRefreshPolicyError(s.to_string())),
        }
    }
}

// == Config ==
/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Live-entry count at which inserting a new key evicts the oldest one
    pub max_entry_limit: usize,
    /// TTL used when `set` is called with a zero duration
    pub expiration: Duration,
    /// Behavior of `set` on an existing key
    pub refresh: RefreshPolicy,
}

impl Config {
    /// Creates a configuration with the default refresh policy.
    ///
    /// # Arguments
    /// * `max_entry_limit` - Live-entry count that triggers capacity eviction
    /// * `expiration` - Default TTL for entries set with a zero duration
    pub fn new(max_entry_limit: usize, expiration: Duration) -> Self {
        Self {
            max_entry_limit,
            expiration,
            refresh: RefreshPolicy::default(),
        }
    }

    /// Sets the refresh policy.
    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    /// Loads a configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `OBJCACHE_MAX_ENTRIES` - Maximum live entries (default: 1000)
    /// - `OBJCACHE_EXPIRATION_SECS` - Default TTL in seconds (default: 300)
    /// - `OBJCACHE_REFRESH` - `reposition` or `replace` (default: reposition)
    ///
    /// Unset variables fall back to their defaults. A variable that is set but
    /// unparsable is an error, as is a configuration that fails [`validate`].
    ///
    /// [`validate`]: Config::validate
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`from_env`](Config::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_entry_limit =
            parse_var(&lookup, "OBJCACHE_MAX_ENTRIES")?.unwrap_or(DEFAULT_MAX_ENTRIES);
        let expiration = parse_var::<u64, _>(&lookup, "OBJCACHE_EXPIRATION_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_EXPIRATION);
        let refresh: RefreshPolicy =
            parse_var(&lookup, "OBJCACHE_REFRESH")?.unwrap_or_default();

        let config = Self {
            max_entry_limit,
            expiration,
            refresh,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a usable cache.
    pub fn validate(&self) -> Result<()> {
        if self.max_entry_limit == 0 {
            return Err(ConfigError::ZeroEntryLimit);
        }
        if self.expiration.is_zero() {
            return Err(ConfigError::ZeroExpiration);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_EXPIRATION)
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }),
    }
}
