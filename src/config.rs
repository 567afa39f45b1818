//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server
//! starts.
//!
//! ## Required Variables
//!
//! - `SHARD_DBS` - comma-separated SQLite shard files, one per shard
//! - `BASE_URL` - public base URL of the redirect service
//!
//! ## Optional Variables
//!
//! - `LISTEN` - bind address (default: `0.0.0.0:3000`)
//! - `STRICT_HOST` - reject requests whose Host header differs from the base
//!   URL host (default: `false`)
//! - `CACHE_ENABLED` - in-process resolution cache (default: `true`)
//! - `CACHE_TTL_SECONDS` - default TTL for cached resolutions (default: 300)
//! - `CACHE_FLUSH_POLL_SECONDS` - shard-file modification poll interval
//!   (default: 10)
//! - `ID_EPOCH_MILLIS` - epoch for id generation; must match the writers that
//!   populated the shards (default: 1657436936000)
//! - `RUST_LOG` - log level (default: `info`)
//! - `LOG_FORMAT` - log format: `text` or `json` (default: `text`)

use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default id-generation epoch: 2022-07-10 07:08:56 UTC.
pub const DEFAULT_EPOCH_MILLIS: u64 = 1_657_436_936_000;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub shard_paths: Vec<PathBuf>,
    pub base_url: Url,
    pub listen_addr: String,
    pub strict_host: bool,
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
    pub watch_poll_seconds: u64,
    pub epoch_millis: u64,
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if shard files or the base URL are missing or invalid.
    pub fn from_env() -> Result<Self> {
        let shard_paths = env::var("SHARD_DBS")
            .context("SHARD_DBS must be set (comma-separated shard files)")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect::<Vec<_>>();
        if shard_paths.is_empty() {
            bail!("SHARD_DBS contains no shard files");
        }

        let base_url = env::var("BASE_URL").context("BASE_URL must be set")?;
        let base_url = parse_base_url(&base_url)?;

        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let strict_host = env::var("STRICT_HOST")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let cache_enabled = env::var("CACHE_ENABLED")
            .map(|v| !(v.eq_ignore_ascii_case("false") || v == "0"))
            .unwrap_or(true);

        let cache_ttl_seconds = env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let watch_poll_seconds = env::var("CACHE_FLUSH_POLL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let epoch_millis = env::var("ID_EPOCH_MILLIS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EPOCH_MILLIS);

        Ok(Self {
            shard_paths,
            base_url,
            listen_addr,
            strict_host,
            cache_enabled,
            cache_ttl_seconds,
            watch_poll_seconds,
            epoch_millis,
            log_level,
            log_format,
        })
    }

    /// Default TTL for cached resolutions.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Shard-file poll interval for the cache-flush watcher.
    pub fn watch_poll(&self) -> Duration {
        Duration::from_secs(self.watch_poll_seconds)
    }

    /// The Host-header value strict mode expects, `None` when strict mode is
    /// off. Includes the port when the base URL carries an explicit one.
    pub fn expected_host(&self) -> Option<String> {
        if !self.strict_host {
            return None;
        }
        let host = self.base_url.host_str()?;
        Some(match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }
}

/// Validates that the base URL is absolute with a scheme and a host.
fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("BASE_URL {raw:?} is not a valid URL"))?;
    if !url.has_host() {
        bail!("BASE_URL {raw:?} has no host");
    }
    Ok(url)
}
