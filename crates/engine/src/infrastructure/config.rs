//! Engine configuration read from the environment.

use std::str::FromStr;
use std::time::Duration;

use cryptforge_domain::{DEFAULT_DUNGEON_DEPTH, MAX_GENERATED_DEPTH, MAX_RUN_LEVELS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Jobs processed at once by the worker loop
    pub worker_concurrency: usize,
    pub lock_lease: Duration,
    /// Levels a run may descend, never above `MAX_RUN_LEVELS`
    pub max_run_depth: u32,
    pub queue_poll_interval: Duration,
    pub world_seed: String,
    /// Depth of dungeons generated from surface entrances
    pub dungeon_depth: u32,
    /// SQLite file for map and run storage; in-memory stores when unset
    pub database_path: Option<String>,
    pub server_host: String,
    pub server_port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: 5,
            lock_lease: Duration::from_secs(3600),
            max_run_depth: MAX_RUN_LEVELS,
            queue_poll_interval: Duration::from_millis(100),
            world_seed: "world".into(),
            dungeon_depth: DEFAULT_DUNGEON_DEPTH,
            database_path: None,
            server_host: "0.0.0.0".into(),
            server_port: 3000,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let worker_concurrency =
            parse_or(&text, "WORKER_CONCURRENCY", defaults.worker_concurrency).max(1);
        let lease_secs =
            parse_or(&text, "LOCK_LEASE_SECONDS", defaults.lock_lease.as_secs()).max(1);
        let max_run_depth =
            parse_or(&text, "MAX_RUN_DEPTH", defaults.max_run_depth).clamp(1, MAX_RUN_LEVELS);
        let poll_ms = parse_or(
            &text,
            "QUEUE_POLL_INTERVAL_MS",
            defaults.queue_poll_interval.as_millis() as u64,
        );
        let dungeon_depth =
            parse_or(&text, "DUNGEON_DEPTH", defaults.dungeon_depth).clamp(1, MAX_GENERATED_DEPTH);
        let server_port = text("SERVER_PORT")
            .or_else(|| text("PORT"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.server_port);

        Self {
            worker_concurrency,
            lock_lease: Duration::from_secs(lease_secs),
            max_run_depth,
            queue_poll_interval: Duration::from_millis(poll_ms),
            world_seed: text("WORLD_SEED").unwrap_or(defaults.world_seed),
            dungeon_depth,
            database_path: text("DATABASE_PATH"),
            server_host: text("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
        }
    }
}

fn parse_or<T>(text: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match text(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(
                key,
                value = %raw,
                default = %default,
                "Invalid config value, using default"
            );
            default
        }),
    }
}
