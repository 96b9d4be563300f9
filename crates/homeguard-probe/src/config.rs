//! Configuration for homeguard.
//!
//! Loaded from `homeguard.toml` (the file prefix is selectable) layered under
//! `HOMEGUARD__<SECTION>__<KEY>` environment variables. Every field has a
//! default, so an absent file yields a working configuration.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use homeguard_core::types::ServiceEntry;
use homeguard_core::{Host, ServiceTable};

use crate::discovery::DEFAULT_CANDIDATE_SUFFIXES;
use crate::error::{ProbeError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

/// Timeouts, pacing, and the fixed tables used by the probers.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// TCP connect timeout per port probe.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Timeout for the benign write after a connection is accepted.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Minimum gap between consecutive probes of one sweep.
    #[serde(default = "default_inter_probe_delay_ms")]
    pub inter_probe_delay_ms: u64,

    /// Echo requests sent per reachability check.
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Upper bound on one ping invocation; exceeding it means unreachable.
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,

    /// Upper bound on each firewall tool invocation.
    #[serde(default = "default_firewall_timeout_secs")]
    pub firewall_timeout_secs: u64,

    /// Last-octet candidates tried during discovery, in probe order.
    #[serde(default = "default_candidate_suffixes")]
    pub candidate_suffixes: Vec<u8>,

    /// Override for the common-port table, in sweep order.
    #[serde(default)]
    pub services: Option<Vec<ServiceEntry>>,
}

impl ProbeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn inter_probe_delay(&self) -> Duration {
        Duration::from_millis(self.inter_probe_delay_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn firewall_timeout(&self) -> Duration {
        Duration::from_secs(self.firewall_timeout_secs)
    }

    /// The configured service table, or the built-in one when unset or empty.
    pub fn service_table(&self) -> ServiceTable {
        match &self.services {
            Some(entries) if !entries.is_empty() => ServiceTable::new(entries.iter().cloned()),
            _ => ServiceTable::common(),
        }
    }
}

/// Where alert records are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_dir")]
    pub dir: String,
}

/// Who receives alert notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Recipients that always receive alerts.
    #[serde(default)]
    pub recipients: Vec<String>,

    /// File holding recipients who registered themselves.
    #[serde(default = "default_registry_file")]
    pub registry_file: String,
}

/// Periodic sweeps of known hosts.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub targets: Vec<WatchTarget>,

    /// Sweeps allowed to run at once, across different hosts.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl WatchConfig {
    /// `max_concurrent` clamped to `1..=4`.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent.clamp(1, MAX_WATCH_CONCURRENCY)
    }
}

/// Upper bound on concurrently running sweeps in watch mode.
pub const MAX_WATCH_CONCURRENCY: usize = 4;

/// A host swept on a fixed interval.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchTarget {
    pub host: Host,

    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_connect_timeout_ms() -> u64 {
    1000
}

fn default_write_timeout_ms() -> u64 {
    500
}

fn default_inter_probe_delay_ms() -> u64 {
    100
}

fn default_ping_count() -> u32 {
    2
}

fn default_ping_timeout_secs() -> u64 {
    5
}

fn default_firewall_timeout_secs() -> u64 {
    3
}

fn default_candidate_suffixes() -> Vec<u8> {
    DEFAULT_CANDIDATE_SUFFIXES.to_vec()
}

fn default_history_dir() -> String {
    "./alerts".to_string()
}

fn default_registry_file() -> String {
    "./recipients.json".to_string()
}

fn default_max_concurrent() -> usize {
    2
}

fn default_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            inter_probe_delay_ms: default_inter_probe_delay_ms(),
            ping_count: default_ping_count(),
            ping_timeout_secs: default_ping_timeout_secs(),
            firewall_timeout_secs: default_firewall_timeout_secs(),
            candidate_suffixes: default_candidate_suffixes(),
            services: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: default_history_dir(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            recipients: Vec::new(),
            registry_file: default_registry_file(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Load configuration from `{file_prefix}.toml` (optional) and the environment.
///
/// Each section is read on its own: a section that is missing or does not
/// deserialize falls back to its defaults (with a warning) without touching
/// the others. A file that cannot be read at all is an error.
pub fn load(file_prefix: &str) -> Result<AppConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("HOMEGUARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ProbeError::Config(e.to_string()))?;

    Ok(AppConfig {
        probe: section(&cfg, "probe"),
        history: section(&cfg, "history"),
        notify: section(&cfg, "notify"),
        watch: section(&cfg, "watch"),
    })
}

fn section<T: DeserializeOwned + Default>(cfg: &config::Config, key: &str) -> T {
    match cfg.get::<T>(key) {
        Ok(value) => value,
        Err(config::ConfigError::NotFound(_)) => T::default(),
        Err(e) => {
            tracing::warn!(section = key, error = %e, "Invalid configuration section, using defaults");
            T::default()
        }
    }
}
