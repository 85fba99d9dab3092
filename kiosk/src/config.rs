//! Configuration for the queue kiosk.
//!
//! Loads configuration from environment variables with sensible defaults.

use queue_kiosk_runtime::StoreConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default tracing filter when `KIOSK_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "ticket_queue=info,queue_kiosk_runtime=info";

/// Kiosk configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KioskConfig {
    /// Tracing filter directive (`KIOSK_LOG`)
    pub log_filter: String,
    /// Capacity of the result-event broadcast channel (`KIOSK_BROADCAST_CAPACITY`)
    pub broadcast_capacity: usize,
    /// Graceful shutdown timeout in seconds (`KIOSK_SHUTDOWN_TIMEOUT_SECS`)
    pub shutdown_timeout_secs: u64,
    /// Install the Prometheus recorder (`KIOSK_METRICS`)
    pub metrics_enabled: bool,
}

impl KioskConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            log_filter: lookup("KIOSK_LOG").unwrap_or(defaults.log_filter),
            broadcast_capacity: lookup("KIOSK_BROADCAST_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.broadcast_capacity),
            shutdown_timeout_secs: lookup("KIOSK_SHUTDOWN_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.shutdown_timeout_secs),
            metrics_enabled: lookup("KIOSK_METRICS")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Shutdown timeout as a [`Duration`]
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Runtime store settings derived from this configuration
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(self.broadcast_capacity)
            .with_shutdown_timeout(self.shutdown_timeout())
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            broadcast_capacity: 64,
            shutdown_timeout_secs: 5,
            metrics_enabled: false,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
