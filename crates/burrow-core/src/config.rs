//! Burrow Configuration
//!
//! This module defines the immutable configuration snapshot that is loaded
//! once at startup and passed into each subsystem at construction time.
//! There is no runtime reload of core parameters; changing them requires a
//! coordinated restart.
//!
//! ## Sections
//!
//! - **[store]**: shard count, queue sizing, ring window size, sample
//!   acceptance distance, and group expiry
//! - **[evaluator]**: result cache cadence
//! - **[[notifier]]**: one entry per sink (webhook or log), each with its
//!   own tick interval, reminder interval, severity threshold, and group
//!   allowlist/blocklist regexes
//! - **[http]**: listener address and request timeout
//! - **[[cluster]]**: the monitored clusters; configured at startup only
//!
//! ## Usage
//!
//! ```ignore
//! use burrow_core::BurrowConfig;
//!
//! let config = BurrowConfig::load("burrow.toml")?;
//! config.validate()?;
//! ```

use crate::error::{BurrowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Offset store and message bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of store shards (default: 20).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Bounded depth of each shard request queue (default: 1).
    #[serde(default = "default_queue_depth", alias = "queue-depth")]
    pub queue_depth: usize,

    /// How long a fetch caller waits for queue space before giving up
    /// with `Busy` (default: 1s). Offset writes never wait; they drop.
    #[serde(default = "default_queue_send_timeout_secs", alias = "queue-send-timeout")]
    pub queue_send_timeout_secs: u64,

    /// Minimum seconds between commits at the same offset before a sample
    /// is accepted rather than dropped as a duplicate (default: 1).
    #[serde(default = "default_min_distance_secs", alias = "min-distance")]
    pub min_distance_secs: u64,

    /// Ring window size W: samples kept per (group, topic, partition)
    /// (default: 15).
    #[serde(default = "default_window_size", alias = "window-size")]
    pub window_size: usize,

    /// Seconds of inactivity after which a group is swept (default: 7 days).
    #[serde(default = "default_expire_group_secs", alias = "expire-group")]
    pub expire_group_secs: u64,

    /// Cadence of the background expiry sweeper (default: 300s).
    #[serde(default = "default_sweep_interval_secs", alias = "sweep-interval")]
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            workers: default_workers(),
            queue_depth: default_queue_depth(),
            queue_send_timeout_secs: default_queue_send_timeout_secs(),
            min_distance_secs: default_min_distance_secs(),
            window_size: default_window_size(),
            expire_group_secs: default_expire_group_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl StoreConfig {
    pub fn min_distance_ms(&self) -> i64 {
        self.min_distance_secs as i64 * 1000
    }

    pub fn expire_group_ms(&self) -> i64 {
        self.expire_group_secs as i64 * 1000
    }
}

/// Evaluator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Sampling cadence in seconds; evaluation results are cached for this
    /// long so the notifier tick and HTTP queries share work (default: 10).
    #[serde(default = "default_intervals_secs", alias = "intervals")]
    pub intervals_secs: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            intervals_secs: default_intervals_secs(),
        }
    }
}

/// Kind of notifier sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// HTTP POST of the event payload to a URL.
    Webhook,
    /// Structured log line per event.
    Log,
}

/// Configuration for one notifier sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Sink name, used in logs and metrics labels.
    pub name: String,

    pub kind: NotifierKind,

    /// Target URL; required for webhook sinks.
    pub url: Option<String>,

    /// Tick interval in seconds (default: 60).
    #[serde(default = "default_notifier_interval_secs", alias = "interval")]
    pub interval_secs: u64,

    /// Minimum seconds between reminder sends for an open incident
    /// (default: 300).
    #[serde(default = "default_send_interval_secs", alias = "send-interval")]
    pub send_interval_secs: u64,

    /// Minimum severity that opens an incident (default: WARN).
    #[serde(default = "default_threshold")]
    pub threshold: crate::types::Severity,

    /// Only groups matching this regex are considered.
    #[serde(default, alias = "group-allowlist")]
    pub group_allowlist: Option<String>,

    /// Groups matching this regex are never considered.
    #[serde(default, alias = "group-blocklist")]
    pub group_blocklist: Option<String>,

    /// Per-dispatch timeout in seconds for webhook sinks (default: 5).
    #[serde(default = "default_sink_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra HTTP headers attached to webhook dispatches.
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

/// HTTP frontend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listener address (default: 0.0.0.0:8000).
    #[serde(default = "default_http_address")]
    pub address: String,

    /// Request timeout in seconds (default: 300).
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            address: default_http_address(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// One monitored Kafka cluster. The broker/consumer clients themselves are
/// external producer modules; the core only needs the namespace and a
/// summary of where the cluster lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,

    /// Broker address list, reported back by the cluster detail endpoint.
    #[serde(default)]
    pub servers: Vec<String>,
}

/// The full immutable configuration snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurrowConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    #[serde(default, rename = "notifier")]
    pub notifiers: Vec<NotifierConfig>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default, rename = "cluster")]
    pub clusters: Vec<ClusterConfig>,
}

impl BurrowConfig {
    /// Load a configuration snapshot from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BurrowError::Config(format!("cannot read config file: {}", e)))?;
        let config: BurrowConfig = toml::from_str(&contents)
            .map_err(|e| BurrowError::Config(format!("cannot parse config file: {}", e)))?;
        Ok(config)
    }

    /// Validate the snapshot. Called once before any worker is spawned;
    /// failure here aborts startup.
    pub fn validate(&self) -> Result<()> {
        if self.store.workers == 0 {
            return Err(BurrowError::Config("store.workers must be > 0".to_string()));
        }
        if self.store.queue_depth == 0 {
            return Err(BurrowError::Config(
                "store.queue_depth must be > 0".to_string(),
            ));
        }
        if self.store.window_size < 2 {
            return Err(BurrowError::Config(
                "store.window_size must be >= 2".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for cluster in &self.clusters {
            if cluster.name.is_empty() {
                return Err(BurrowError::Config("cluster name must not be empty".to_string()));
            }
            if !seen.insert(cluster.name.as_str()) {
                return Err(BurrowError::Config(format!(
                    "duplicate cluster name: {}",
                    cluster.name
                )));
            }
        }

        for notifier in &self.notifiers {
            if notifier.name.is_empty() {
                return Err(BurrowError::Config("notifier name must not be empty".to_string()));
            }
            if notifier.kind == NotifierKind::Webhook && notifier.url.is_none() {
                return Err(BurrowError::Config(format!(
                    "notifier {} is a webhook but has no url",
                    notifier.name
                )));
            }
            for pattern in [&notifier.group_allowlist, &notifier.group_blocklist]
                .into_iter()
                .flatten()
            {
                regex::Regex::new(pattern).map_err(|e| {
                    BurrowError::Config(format!(
                        "notifier {} has an invalid group filter: {}",
                        notifier.name, e
                    ))
                })?;
            }
        }

        self.http
            .address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| BurrowError::Config(format!("invalid http.address: {}", e)))?;

        Ok(())
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterConfig> {
        self.clusters.iter().find(|c| c.name == name)
    }
}

fn default_workers() -> usize {
    20
}

fn default_queue_depth() -> usize {
    1
}

fn default_queue_send_timeout_secs() -> u64 {
    1
}

fn default_min_distance_secs() -> u64 {
    1
}

fn default_window_size() -> usize {
    15
}

fn default_expire_group_secs() -> u64 {
    604_800 // 7 days
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_intervals_secs() -> u64 {
    10
}

fn default_notifier_interval_secs() -> u64 {
    60
}

fn default_send_interval_secs() -> u64 {
    300
}

fn default_threshold() -> crate::types::Severity {
    crate::types::Severity::Warn
}

fn default_sink_timeout_secs() -> u64 {
    5
}

fn default_http_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_http_timeout_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: BurrowConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.workers, 20);
        assert_eq!(config.store.queue_depth, 1);
        assert_eq!(config.store.window_size, 15);
        assert_eq!(config.store.expire_group_secs, 604_800);
        assert_eq!(config.store.min_distance_secs, 1);
        assert_eq!(config.evaluator.intervals_secs, 10);
        assert_eq!(config.http.address, "0.0.0.0:8000");
        assert!(config.clusters.is_empty());
        assert!(config.notifiers.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_full_config_parses() {
        let toml = r#"
            [store]
            workers = 4
            window_size = 10

            [evaluator]
            intervals_secs = 30

            [[cluster]]
            name = "local"
            servers = ["kafka-1:9092", "kafka-2:9092"]

            [[notifier]]
            name = "ops-webhook"
            kind = "webhook"
            url = "http://alerts.example.com/burrow"
            threshold = "ERR"
            group_blocklist = "^console-consumer-.*"

            [http]
            address = "127.0.0.1:8100"
        "#;
        let config: BurrowConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.store.workers, 4);
        assert_eq!(config.clusters.len(), 1);
        assert_eq!(config.cluster("local").unwrap().servers.len(), 2);
        assert!(config.cluster("missing").is_none());
        assert_eq!(config.notifiers[0].threshold, Severity::Err);
        assert_eq!(config.notifiers[0].send_interval_secs, 300);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config: BurrowConfig = toml::from_str("[store]\nworkers = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_webhook_without_url_rejected() {
        let toml = r#"
            [[notifier]]
            name = "broken"
            kind = "webhook"
        "#;
        let config: BurrowConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_filter_regex_rejected() {
        let toml = r#"
            [[notifier]]
            name = "bad-regex"
            kind = "log"
            group_allowlist = "("
        "#;
        let config: BurrowConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_cluster_rejected() {
        let toml = r#"
            [[cluster]]
            name = "local"

            [[cluster]]
            name = "local"
        "#;
        let config: BurrowConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("burrow.toml");
        std::fs::write(&path, "[store]\nworkers = 2\n").unwrap();

        let config = BurrowConfig::load(&path).unwrap();
        assert_eq!(config.store.workers, 2);

        assert!(BurrowConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
