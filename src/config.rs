//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_CAPACITY, DEFAULT_MAX_FILE_SIZE, DEFAULT_SCAN_INTERVAL_SECS};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory served under `/static`
    pub static_root: PathBuf,
    /// HTTP server port
    pub server_port: u16,
    /// Largest file the cache will hold, in bytes
    pub max_file_size: u64,
    /// Total bytes the cache may hold
    pub max_capacity: u64,
    /// Seconds between reconciliation scans (also the idle TTL)
    pub scan_interval: u64,
    /// Debug mode serves every file from disk
    pub debug: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STATIC_ROOT` - Directory to serve (default: ./static)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_FILE_SIZE` - Per-file cache limit in bytes (default: 4 MiB)
    /// - `MAX_CACHE_CAPACITY` - Total cache budget in bytes (default: 64 MiB)
    /// - `SCAN_INTERVAL` - Scan frequency in seconds (default: 60)
    /// - `DEBUG` - `1`, `true` or `yes` disables the cache (default: off)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            static_root: env::var("STATIC_ROOT")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.static_root),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            max_file_size: parse_var("MAX_FILE_SIZE").unwrap_or(defaults.max_file_size),
            max_capacity: parse_var("MAX_CACHE_CAPACITY").unwrap_or(defaults.max_capacity),
            scan_interval: parse_var::<u64>("SCAN_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.scan_interval),
            debug: env::var("DEBUG")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.debug),
        }
    }

    /// The cache runs in release mode only.
    pub fn cache_enabled(&self) -> bool {
        !self.debug
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            static_root: PathBuf::from("./static"),
            server_port: 3000,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_capacity: DEFAULT_MAX_CAPACITY,
            scan_interval: DEFAULT_SCAN_INTERVAL_SECS,
            debug: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.static_root, PathBuf::from("./static"));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.max_file_size, 4 * 1024 * 1024);
        assert_eq!(config.max_capacity, 64 * 1024 * 1024);
        assert_eq!(config.scan_interval, 60);
        assert!(!config.debug);
        assert!(config.cache_enabled());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("STATIC_ROOT");
        env::remove_var("SERVER_PORT");
        env::remove_var("MAX_FILE_SIZE");
        env::remove_var("MAX_CACHE_CAPACITY");
        env::remove_var("SCAN_INTERVAL");
        env::remove_var("DEBUG");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.max_capacity, DEFAULT_MAX_CAPACITY);
        assert_eq!(config.scan_interval(), Duration::from_secs(60));
        assert!(config.cache_enabled());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_debug_disables_cache() {
        let config = Config {
            debug: true,
            ..Config::default()
        };
        assert!(!config.cache_enabled());
    }
}
