//! Thread-safe gauge registry backed by a Prometheus exposition registry.
//!
//! All gauge writes go through [`MetricRegistry::set`], which serializes
//! them behind one mutex so the scrape thread always observes a consistent
//! snapshot. Gauges are registered once at startup and never added or
//! removed at runtime; the enablement set only gates whether a value is
//! refreshed.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};

/// Names of the exported gauges, shared with the configuration layer.
pub mod names {
    pub const CPU_USAGE: &str = "cpu_usage_percentage";
    pub const MEMORY_USAGE: &str = "memory_usage_percentage";
    pub const MEMORY_USAGE_FRACTION: &str = "memory_usage_2";
    pub const MEMORY_TOTAL: &str = "memory_total";
    pub const MEMORY_AVAILABLE: &str = "memory_available";
    pub const DISK_USAGE: &str = "disk_usage_percentage";
    pub const DISK_STATS: &str = "disk_stats";
    pub const NETWORK_USAGE: &str = "network_usage";
    pub const BANDWIDTH_USAGE: &str = "bandwidth_usage";
    pub const MINOR_PAGE_FAULTS: &str = "minor_page_faults";
    pub const MAJOR_PAGE_FAULTS: &str = "major_page_faults";
    pub const CHANGE_CONTEXTS: &str = "change_contexts";
    pub const TOTAL_PROCESSES: &str = "total_processes";
}

/// Every exported gauge with its help text, registered at startup.
const GAUGES: &[(&str, &str)] = &[
    (names::CPU_USAGE, "CPU utilization percent"),
    (names::MEMORY_USAGE, "Memory usage percent"),
    (names::MEMORY_USAGE_FRACTION, "Memory usage as a 0-1 fraction"),
    (names::MEMORY_TOTAL, "Total system memory in kB"),
    (names::MEMORY_AVAILABLE, "Available system memory in kB"),
    (names::DISK_USAGE, "MB read+written on the watched disk since the previous cycle"),
    (names::DISK_STATS, "Cumulative read+write requests on the watched disk"),
    (names::NETWORK_USAGE, "Cumulative network traffic in MB over all interfaces"),
    (names::BANDWIDTH_USAGE, "Network bandwidth in MB/s over all interfaces"),
    (names::MINOR_PAGE_FAULTS, "Minor page faults since boot"),
    (names::MAJOR_PAGE_FAULTS, "Major page faults since boot"),
    (names::CHANGE_CONTEXTS, "Context switches since boot"),
    (names::TOTAL_PROCESSES, "Processes forked since boot"),
];

/// Registry of named gauges shared between the sampling loop and the
/// scrape handler.
pub struct MetricRegistry {
    registry: Registry,
    gauges: HashMap<&'static str, Gauge>,
    /// Guards every write and snapshot; each `set` is one atomic replace.
    /// A gauge that was never set reports the Prometheus default of 0.0.
    values: Mutex<HashMap<&'static str, f64>>,
}

impl MetricRegistry {
    /// Creates the registry and registers all gauges.
    ///
    /// A failure here is fatal to the process: without the gauges there is
    /// nothing to export.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let mut gauges = HashMap::with_capacity(GAUGES.len());

        for &(name, help) in GAUGES {
            let gauge = Gauge::with_opts(Opts::new(name, help))?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.insert(name, gauge);
        }

        Ok(Self {
            registry,
            gauges,
            values: Mutex::new(HashMap::new()),
        })
    }

    /// Records the latest valid value for a gauge.
    ///
    /// Unknown names are ignored (registration is fixed at startup).
    pub fn set(&self, name: &'static str, value: f64) {
        let Some(gauge) = self.gauges.get(name) else {
            return;
        };
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        gauge.set(value);
        values.insert(name, value);
    }

    /// Returns the last published value for a gauge, if any.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Returns a consistent copy of every published value.
    pub fn snapshot(&self) -> HashMap<&'static str, f64> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Encodes all gauges in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
