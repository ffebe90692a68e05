//! JSON configuration with live-reloadable metric enablement.
//!
//! The configuration file is re-read on every sampling tick, so edits take
//! effect without a restart. Any load failure falls back to compiled-in
//! defaults (1 second interval, all metrics enabled) instead of halting.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::registry::names;

/// Default sampling interval when the configuration is absent or invalid.
pub const DEFAULT_INTERVAL_SECS: u64 = 1;

/// On-disk configuration document.
#[derive(Debug, Deserialize)]
struct MonitorConfig {
    #[serde(default = "default_interval")]
    sampling_interval: u64,
    #[serde(default)]
    metrics: Vec<String>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

/// Which gated metrics get refreshed this cycle.
///
/// An immutable value, rebuilt wholesale on every reload; metrics not
/// listed here always refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnablementSet {
    pub bandwidth: bool,
    pub cpu: bool,
    pub disk: bool,
    pub context_switches: bool,
}

impl EnablementSet {
    /// All gated metrics enabled; used when no configuration is available.
    pub fn all_enabled() -> Self {
        Self {
            bandwidth: true,
            cpu: true,
            disk: true,
            context_switches: true,
        }
    }

    fn from_metric_list(metrics: &[String]) -> Self {
        let mut set = Self {
            bandwidth: false,
            cpu: false,
            disk: false,
            context_switches: false,
        };
        for metric in metrics {
            match metric.as_str() {
                names::BANDWIDTH_USAGE => set.bandwidth = true,
                names::CPU_USAGE => set.cpu = true,
                names::DISK_USAGE => set.disk = true,
                names::CHANGE_CONTEXTS => set.context_switches = true,
                other => warn!("unknown metric in configuration: {}", other),
            }
        }
        set
    }
}

/// Effective settings for one sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub interval: Duration,
    pub enabled: EnablementSet,
}

impl Settings {
    /// Compiled-in defaults used on any configuration failure.
    pub fn defaults() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            enabled: EnablementSet::all_enabled(),
        }
    }
}

/// Loads settings from a JSON file, falling back to defaults on failure.
///
/// Never returns an error: a missing or malformed file degrades to
/// [`Settings::defaults`], and an interval of zero is lifted to the
/// default to avoid a busy loop.
pub fn load(path: &Path) -> Settings {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("config {} unreadable ({}), using defaults", path.display(), e);
            return Settings::defaults();
        }
    };

    let config: MonitorConfig = match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("config {} invalid ({}), using defaults", path.display(), e);
            return Settings::defaults();
        }
    };

    let secs = if config.sampling_interval == 0 {
        DEFAULT_INTERVAL_SECS
    } else {
        config.sampling_interval
    };

    Settings {
        interval: Duration::from_secs(secs),
        enabled: EnablementSet::from_metric_list(&config.metrics),
    }
}
