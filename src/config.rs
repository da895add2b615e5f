//! Typed runtime configuration, loaded from the environment.
//!
//! Replaces the "dynamic option bag" anti-pattern called out in the
//! Design Notes: one struct, one set of recognized fields, validated once
//! at startup instead of probed ad hoc throughout the codebase.

use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub grpc_endpoint: String,
    pub rpc_endpoint: String,

    pub tick_array_radius: i64,
    pub bin_array_radius: i64,
    pub boundary_buffer: i64,
    pub refresh_interval: Duration,
    pub max_concurrent_rpc: usize,
    pub stale_threshold: Duration,
    pub min_candidate_spread_bps: i64,
    pub dust_threshold_lamports: u64,
    pub debounce_window: Duration,

    pub stream_stall_threshold: Duration,
    pub reconnect_backoff_cap: Duration,

    pub hotlist_path: String,
    pub opportunity_log_path: String,

    pub tip_floor_feed_url: String,
    pub tip_floor_refresh_interval: Duration,

    pub enable_real_trading: bool,
}

impl Config {
    /// Loads `.env` (if present) then reads environment variables, falling
    /// back to the same defaults the Design Notes enumerate.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let cfg = Config {
            grpc_endpoint: env_string("GRPC_ENDPOINT", "http://127.0.0.1:10000"),
            rpc_endpoint: env_string("RPC_ENDPOINT", "http://127.0.0.1:8899"),

            tick_array_radius: env_parsed("TICK_ARRAY_RADIUS", 3),
            bin_array_radius: env_parsed("BIN_ARRAY_RADIUS", 3),
            boundary_buffer: env_parsed("BOUNDARY_BUFFER", 1),
            refresh_interval: Duration::from_millis(env_parsed("REFRESH_INTERVAL_MS", 5_000)),
            max_concurrent_rpc: env_parsed("MAX_CONCURRENT_RPC", 12),
            stale_threshold: Duration::from_millis(env_parsed("STALE_THRESHOLD_MS", 30_000)),
            min_candidate_spread_bps: env_parsed("MIN_CANDIDATE_SPREAD_BPS", 30),
            dust_threshold_lamports: env_parsed("DUST_THRESHOLD_LAMPORTS", 1_000_000),
            debounce_window: Duration::from_millis(env_parsed("DEBOUNCE_WINDOW_MS", 100)),

            stream_stall_threshold: Duration::from_secs(env_parsed("STREAM_STALL_SECS", 30)),
            reconnect_backoff_cap: Duration::from_secs(env_parsed("RECONNECT_BACKOFF_CAP_SECS", 30)),

            hotlist_path: env_string("ALT_HOTLIST_PATH", "alt_hotlist.txt"),
            opportunity_log_path: env_string("OPPORTUNITY_LOG_PATH", "opportunities.ndjson"),

            tip_floor_feed_url: env_string("TIP_FLOOR_FEED_URL", "https://bundles.jito.wtf/api/v1/bundles/tip_floor"),
            tip_floor_refresh_interval: Duration::from_millis(env_parsed("TIP_FLOOR_REFRESH_INTERVAL_MS", 10_000)),

            enable_real_trading: env_bool("ENABLE_REAL_TRADING", false),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.grpc_endpoint.is_empty() {
            anyhow::bail!("GRPC_ENDPOINT must not be empty");
        }
        if self.rpc_endpoint.is_empty() {
            anyhow::bail!("RPC_ENDPOINT must not be empty");
        }
        if self.tick_array_radius < 1 {
            anyhow::bail!("TICK_ARRAY_RADIUS must be >= 1, got {}", self.tick_array_radius);
        }
        if self.bin_array_radius < 1 {
            anyhow::bail!("BIN_ARRAY_RADIUS must be >= 1, got {}", self.bin_array_radius);
        }
        if self.max_concurrent_rpc == 0 {
            anyhow::bail!("MAX_CONCURRENT_RPC must be > 0");
        }
        if self.min_candidate_spread_bps < 0 {
            anyhow::bail!("MIN_CANDIDATE_SPREAD_BPS must be >= 0");
        }
        Ok(())
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_rpc_concurrency() {
        let mut cfg = default_for_test();
        cfg.max_concurrent_rpc = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_negative_spread_floor() {
        let mut cfg = default_for_test();
        cfg.min_candidate_spread_bps = -1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_defaults() {
        assert!(default_for_test().validate().is_ok());
    }

    fn default_for_test() -> Config {
        Config {
            grpc_endpoint: "http://localhost:10000".into(),
            rpc_endpoint: "http://localhost:8899".into(),
            tick_array_radius: 3,
            bin_array_radius: 3,
            boundary_buffer: 1,
            refresh_interval: Duration::from_millis(5_000),
            max_concurrent_rpc: 12,
            stale_threshold: Duration::from_millis(30_000),
            min_candidate_spread_bps: 30,
            dust_threshold_lamports: 1_000_000,
            debounce_window: Duration::from_millis(100),
            stream_stall_threshold: Duration::from_secs(30),
            reconnect_backoff_cap: Duration::from_secs(30),
            hotlist_path: "alt_hotlist.txt".into(),
            opportunity_log_path: "opportunities.ndjson".into(),
            tip_floor_feed_url: "https://bundles.jito.wtf/api/v1/bundles/tip_floor".into(),
            tip_floor_refresh_interval: Duration::from_millis(10_000),
            enable_real_trading: false,
        }
    }
}
