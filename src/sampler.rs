//! The sampling loop: read -> compute delta -> publish, on a cadence.
//!
//! One instance runs on a dedicated thread for the process lifetime. All
//! rate-tracker state lives here and is never shared; only the registry
//! crosses the thread boundary. A failure in any single metric's pipeline
//! is logged and skipped, never fatal.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::collector::{FileSystem, SystemCollector};
use crate::config::{self, EnablementSet};
use crate::rates::{
    BandwidthTracker, CpuTracker, DiskTracker, Rate, bytes_to_mb, memory_usage_percent,
};
use crate::registry::{MetricRegistry, names};

/// Orchestrates one metric pipeline per tick for every enabled metric.
pub struct Sampler<F: FileSystem> {
    collector: SystemCollector<F>,
    disk_device: String,
    registry: Arc<MetricRegistry>,
    cpu: CpuTracker,
    disk: DiskTracker,
    bandwidth: BandwidthTracker,
}

impl<F: FileSystem> Sampler<F> {
    pub fn new(
        collector: SystemCollector<F>,
        disk_device: impl Into<String>,
        registry: Arc<MetricRegistry>,
    ) -> Self {
        Self {
            collector,
            disk_device: disk_device.into(),
            registry,
            cpu: CpuTracker::default(),
            disk: DiskTracker::default(),
            bandwidth: BandwidthTracker::default(),
        }
    }

    /// Runs every enabled pipeline once.
    ///
    /// `now` is injected so tests can control elapsed time.
    pub fn tick(&mut self, enabled: &EnablementSet, now: Instant) {
        if enabled.cpu {
            match self.collector.collect_cpu_times() {
                Ok(sample) => {
                    let rate = self.cpu.update(&sample);
                    self.publish(names::CPU_USAGE, rate);
                }
                Err(e) => warn!("cpu sample failed: {}", e),
            }
        }

        match self.collector.collect_meminfo() {
            Ok(mem) => match memory_usage_percent(&mem) {
                Some(pct) => {
                    self.registry.set(names::MEMORY_USAGE, pct);
                    self.registry.set(names::MEMORY_USAGE_FRACTION, pct / 100.0);
                    self.registry.set(names::MEMORY_TOTAL, mem.total_kb as f64);
                    self.registry
                        .set(names::MEMORY_AVAILABLE, mem.available_kb as f64);
                }
                None => warn!("memory sample unusable: MemTotal is zero"),
            },
            Err(e) => warn!("memory sample failed: {}", e),
        }

        match self.collector.collect_diskstats(&self.disk_device) {
            Ok(disk) => {
                self.registry
                    .set(names::DISK_STATS, (disk.reads + disk.writes) as f64);
                if enabled.disk {
                    let rate = self.disk.update(&disk);
                    self.publish(names::DISK_USAGE, rate);
                }
            }
            Err(e) => warn!("disk sample failed ({}): {}", self.disk_device, e),
        }

        match self.collector.collect_net_dev() {
            Ok(net) => {
                self.registry
                    .set(names::NETWORK_USAGE, bytes_to_mb(net.rx_bytes + net.tx_bytes));
                if enabled.bandwidth {
                    let rate = self.bandwidth.update(&net, now);
                    self.publish(names::BANDWIDTH_USAGE, rate);
                }
            }
            Err(e) => warn!("network sample failed: {}", e),
        }

        match self.collector.collect_vmstat() {
            Ok(vm) => {
                self.registry
                    .set(names::MINOR_PAGE_FAULTS, vm.pgfault as f64);
                self.registry
                    .set(names::MAJOR_PAGE_FAULTS, vm.pgmajfault as f64);
            }
            Err(e) => warn!("vmstat sample failed: {}", e),
        }

        match self.collector.collect_kernel_stat() {
            Ok(stat) => {
                self.registry
                    .set(names::TOTAL_PROCESSES, stat.processes as f64);
                if enabled.context_switches {
                    self.registry.set(names::CHANGE_CONTEXTS, stat.ctxt as f64);
                }
            }
            Err(e) => warn!("kernel stat sample failed: {}", e),
        }
    }

    fn publish(&self, name: &'static str, rate: Rate) {
        match rate {
            Rate::Value(v) => self.registry.set(name, v),
            Rate::Insufficient => debug!("{}: waiting for baseline sample", name),
            Rate::Discontinuity => warn!("{}: counter went backwards, re-baselined", name),
            Rate::Idle => debug!("{}: counters unchanged, keeping previous value", name),
        }
    }

    /// Runs the loop until `running` goes false.
    ///
    /// The configuration is reloaded on every tick, so enablement and
    /// interval changes take effect on the next cycle without a restart.
    pub fn run(mut self, config_path: &Path, running: &AtomicBool) {
        info!("sampling loop started (config: {})", config_path.display());

        while running.load(Ordering::SeqCst) {
            let settings = config::load(config_path);
            self.tick(&settings.enabled, Instant::now());

            // Chunked sleep so a shutdown signal is honored promptly.
            let step = Duration::from_millis(100);
            let mut remaining = settings.interval;
            while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
                let dt = remaining.min(step);
                std::thread::sleep(dt);
                remaining = remaining.saturating_sub(dt);
            }
        }

        info!("sampling loop stopped");
    }
}
