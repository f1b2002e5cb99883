//! ObjCache demo - drives the cache from several threads and reports stats
//!
//! Configuration comes from `OBJCACHE_*` environment variables; the final
//! statistics are printed as JSON.

use std::env;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use objcache::{Config, ObjCache};

const DEFAULT_THREADS: usize = 4;
const DEFAULT_OPS: usize = 10_000;

/// Reads a positive integer from `var`, falling back to `default` when unset.
fn demo_setting(var: &str, default: usize) -> Result<usize> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a positive integer, got {:?}", var, value)),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "objcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load cache configuration")?;
    let threads = demo_setting("OBJCACHE_DEMO_THREADS", DEFAULT_THREADS)?.max(1);
    let ops = demo_setting("OBJCACHE_DEMO_OPS", DEFAULT_OPS)?;
    info!(
        "Configuration loaded: max_entry_limit={}, expiration={:?}, refresh={:?}",
        config.max_entry_limit, config.expiration, config.refresh
    );

    let cache: ObjCache<String, String> = ObjCache::new(config);
    // Twice as many keys as slots, so capacity eviction is exercised
    let key_space = cache.config().max_entry_limit.saturating_mul(2).max(1);

    let started = Instant::now();
    thread::scope(|scope| {
        for t in 0..threads {
            let cache = &cache;
            scope.spawn(move || {
                for i in 0..ops {
                    let key = format!("key-{}", (t * 31 + i * 17) % key_space);
                    match i % 4 {
                        0 => cache.set(key, format!("value-{}-{}", t, i), Duration::ZERO),
                        3 => {
                            cache.del(key.as_str());
                        }
                        _ => {
                            cache.get(key.as_str());
                        }
                    }
                }
            });
        }
    });
    info!(
        "Workload finished: {} threads x {} ops in {:?}",
        threads,
        ops,
        started.elapsed()
    );

    let purged = cache.purge_expired();
    if purged > 0 {
        info!("Purged {} expired entries", purged);
    }

    let stats = cache.stats();
    info!("Hit rate: {:.2}%", stats.hit_rate() * 100.0);
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("Failed to serialize cache stats")?
    );

    Ok(())
}
