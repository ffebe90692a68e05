//! Delta-rate computation for CPU, disk, and network counters.
//!
//! This module is the **single source of truth** for converting raw
//! monotonic counters into rate/percentage gauges. Each rate metric owns
//! one tracker struct holding the previous sample; the sampling loop is
//! the only caller, so no synchronization is needed here.

use std::time::Instant;

use crate::collector::parser::{CpuTimes, DiskCounters, MemInfo, NetCounters};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Bytes per block-device sector in `/proc/diskstats`.
pub const SECTOR_SIZE: u64 = 512;

/// Bytes per megabyte (MiB).
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// ---------------------------------------------------------------------------
// Results and delta helpers
// ---------------------------------------------------------------------------

/// Outcome of one rate computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    /// A valid gauge value, ready to publish.
    Value(f64),
    /// No previous sample yet; the current sample became the baseline.
    Insufficient,
    /// A counter decreased (reset/wraparound); state was re-baselined
    /// and no rate is produced this cycle.
    Discontinuity,
    /// The counters did not advance at all (CPU total delta of zero);
    /// the previously published value remains meaningful.
    Idle,
}

impl Rate {
    /// Returns the contained value, if any.
    pub fn value(self) -> Option<f64> {
        match self {
            Rate::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Compute u64 delta, returning `None` on counter regression (reset).
pub fn du64(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

/// Converts a byte count to megabytes.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

// ---------------------------------------------------------------------------
// CPU utilization
// ---------------------------------------------------------------------------

/// Rate tracking state for aggregate CPU utilization.
///
/// CPU times are jiffy counters, so the elapsed wall-clock time is not
/// needed: the jiffy deltas themselves measure the interval.
#[derive(Debug, Default)]
pub struct CpuTracker {
    prev: Option<CpuTimes>,
}

impl CpuTracker {
    /// Computes CPU utilization percent from the delta against the
    /// previous sample, clamped to [0, 100].
    pub fn update(&mut self, curr: &CpuTimes) -> Rate {
        let Some(prev) = self.prev.replace(curr.clone()) else {
            return Rate::Insufficient;
        };

        let (
            Some(user),
            Some(nice),
            Some(system),
            Some(idle),
            Some(iowait),
            Some(irq),
            Some(softirq),
            Some(steal),
        ) = (
            du64(curr.user, prev.user),
            du64(curr.nice, prev.nice),
            du64(curr.system, prev.system),
            du64(curr.idle, prev.idle),
            du64(curr.iowait, prev.iowait),
            du64(curr.irq, prev.irq),
            du64(curr.softirq, prev.softirq),
            du64(curr.steal, prev.steal),
        )
        else {
            // Counter went backwards; state is already re-baselined above.
            return Rate::Discontinuity;
        };

        let idle_d = idle + iowait;
        let busy_d = user + nice + system + irq + softirq + steal;
        let total_d = idle_d + busy_d;

        if total_d == 0 {
            return Rate::Idle;
        }

        let pct = (busy_d as f64 / total_d as f64 * 100.0).clamp(0.0, 100.0);
        Rate::Value(pct)
    }
}

// ---------------------------------------------------------------------------
// Disk throughput
// ---------------------------------------------------------------------------

/// Rate tracking state for disk sector throughput.
///
/// Reports megabytes moved since the previous cycle. Deliberately not
/// normalized per second: the sampling interval is the reporting unit.
#[derive(Debug, Default)]
pub struct DiskTracker {
    prev: Option<DiskCounters>,
}

impl DiskTracker {
    /// Computes MB read+written since the previous sample.
    pub fn update(&mut self, curr: &DiskCounters) -> Rate {
        let Some(prev) = self.prev.replace(curr.clone()) else {
            return Rate::Insufficient;
        };

        let (Some(dr), Some(dw)) = (
            du64(curr.read_sectors, prev.read_sectors),
            du64(curr.write_sectors, prev.write_sectors),
        ) else {
            return Rate::Discontinuity;
        };

        Rate::Value(bytes_to_mb((dr + dw) * SECTOR_SIZE))
    }
}

// ---------------------------------------------------------------------------
// Network bandwidth
// ---------------------------------------------------------------------------

/// Rate tracking state for network bandwidth.
///
/// The only per-second metric: byte deltas divided by elapsed wall-clock
/// seconds, in MB/s.
#[derive(Debug, Default)]
pub struct BandwidthTracker {
    prev: Option<(NetCounters, Instant)>,
    last: Option<f64>,
}

impl BandwidthTracker {
    /// Computes MB/s over the elapsed time since the previous sample.
    ///
    /// If the clock has not advanced, the last published value is reused
    /// and the baseline is left untouched.
    pub fn update(&mut self, curr: &NetCounters, now: Instant) -> Rate {
        let Some((prev, prev_t)) = &self.prev else {
            self.prev = Some((curr.clone(), now));
            return Rate::Insufficient;
        };

        let (Some(drx), Some(dtx)) = (
            du64(curr.rx_bytes, prev.rx_bytes),
            du64(curr.tx_bytes, prev.tx_bytes),
        ) else {
            self.prev = Some((curr.clone(), now));
            return Rate::Discontinuity;
        };

        let elapsed = now.duration_since(*prev_t).as_secs_f64();
        if elapsed <= 0.0 {
            return match self.last {
                Some(v) => Rate::Value(v),
                None => Rate::Insufficient,
            };
        }

        let mb_s = bytes_to_mb(drx + dtx) / elapsed;
        self.prev = Some((curr.clone(), now));
        self.last = Some(mb_s);
        Rate::Value(mb_s)
    }
}

// ---------------------------------------------------------------------------
// Memory (not a delta metric)
// ---------------------------------------------------------------------------

/// Computes memory usage percent from a single sample.
///
/// Exception to the rate pattern: memory usage is an instantaneous ratio,
/// `100 * (total - available) / total`, clamped to [0, 100]. Returns
/// `None` when the total is zero (unusable sample).
pub fn memory_usage_percent(mem: &MemInfo) -> Option<f64> {
    if mem.total_kb == 0 {
        return None;
    }
    let used = mem.total_kb.saturating_sub(mem.available_kb);
    Some((used as f64 / mem.total_kb as f64 * 100.0).clamp(0.0, 100.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cpu(user: u64, system: u64, idle: u64) -> CpuTimes {
        CpuTimes {
            user,
            system,
            idle,
            ..Default::default()
        }
    }

    fn disk(read_sectors: u64, write_sectors: u64) -> DiskCounters {
        DiskCounters {
            read_sectors,
            write_sectors,
            ..Default::default()
        }
    }

    fn net(rx_bytes: u64, tx_bytes: u64) -> NetCounters {
        NetCounters { rx_bytes, tx_bytes }
    }

    // ===== CPU =====

    #[test]
    fn cpu_first_sample_is_baseline() {
        let mut t = CpuTracker::default();
        assert_eq!(t.update(&cpu(100, 50, 850)), Rate::Insufficient);
    }

    #[test]
    fn cpu_usage_from_stat_scenario() {
        // cpu  100 0 50 850 0 0 0 0  ->  cpu  120 0 60 870 0 0 0 0
        // busy delta = 20 + 10 = 30, idle delta = 20, total = 50 -> 60%
        let mut t = CpuTracker::default();
        t.update(&cpu(100, 50, 850));
        let r = t.update(&cpu(120, 60, 870));
        let v = r.value().expect("rate should exist");
        assert!((v - 60.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_clamped_to_valid_range() {
        let mut t = CpuTracker::default();
        t.update(&cpu(0, 0, 0));
        // Fully busy interval.
        let v = t.update(&cpu(1000, 1000, 0)).value().unwrap();
        assert!((v - 100.0).abs() < 1e-9);

        // Fully idle interval.
        let v = t.update(&cpu(1000, 1000, 500)).value().unwrap();
        assert!((v - 0.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_unchanged_counters_signal_idle() {
        let mut t = CpuTracker::default();
        t.update(&cpu(100, 50, 850));
        assert_eq!(t.update(&cpu(100, 50, 850)), Rate::Idle);
    }

    #[test]
    fn cpu_regression_rebaselines() {
        let mut t = CpuTracker::default();
        t.update(&cpu(100, 50, 850));
        // Counter reset (e.g. reboot of the monitored namespace).
        assert_eq!(t.update(&cpu(10, 5, 85)), Rate::Discontinuity);

        // Next delta is computed against the re-baselined sample.
        let v = t.update(&cpu(20, 10, 100)).value().unwrap();
        assert!((v - 50.0).abs() < 1e-9);
        assert!(v >= 0.0);
    }

    // ===== Disk =====

    #[test]
    fn disk_first_sample_is_baseline() {
        let mut t = DiskTracker::default();
        assert_eq!(t.update(&disk(1000, 2000)), Rate::Insufficient);
    }

    #[test]
    fn disk_delta_in_megabytes() {
        let mut t = DiskTracker::default();
        t.update(&disk(1000, 2000));
        // 2048 + 2048 sectors moved = 4096 * 512 bytes = 2 MB
        let v = t.update(&disk(3048, 4048)).value().unwrap();
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn disk_unchanged_counters_yield_zero() {
        let mut t = DiskTracker::default();
        t.update(&disk(1000, 2000));
        let v = t.update(&disk(1000, 2000)).value().unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn disk_regression_rebaselines() {
        let mut t = DiskTracker::default();
        t.update(&disk(1000, 2000));
        assert_eq!(t.update(&disk(10, 20)), Rate::Discontinuity);

        let v = t.update(&disk(2058, 20)).value().unwrap();
        assert!((v - 1.0).abs() < 1e-9);
    }

    // ===== Bandwidth =====

    #[test]
    fn bandwidth_first_sample_is_baseline() {
        let mut t = BandwidthTracker::default();
        assert_eq!(t.update(&net(1000, 2000), Instant::now()), Rate::Insufficient);
    }

    #[test]
    fn bandwidth_per_second_rate() {
        let mut t = BandwidthTracker::default();
        let t0 = Instant::now();
        t.update(&net(0, 0), t0);

        // 2 MB moved over 2 seconds = 1 MB/s
        let t1 = t0 + Duration::from_secs(2);
        let v = t
            .update(&net(1024 * 1024, 1024 * 1024), t1)
            .value()
            .unwrap();
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bandwidth_zero_elapsed_reuses_last_value() {
        let mut t = BandwidthTracker::default();
        let t0 = Instant::now();
        t.update(&net(0, 0), t0);

        let t1 = t0 + Duration::from_secs(1);
        let first = t.update(&net(1024 * 1024, 0), t1).value().unwrap();

        // Same instant again: no division, previous value republished.
        let v = t.update(&net(5 * 1024 * 1024, 0), t1).value().unwrap();
        assert_eq!(v, first);
    }

    #[test]
    fn bandwidth_zero_elapsed_without_history_is_insufficient() {
        let mut t = BandwidthTracker::default();
        let t0 = Instant::now();
        t.update(&net(0, 0), t0);
        assert_eq!(t.update(&net(100, 100), t0), Rate::Insufficient);
    }

    #[test]
    fn bandwidth_regression_rebaselines() {
        let mut t = BandwidthTracker::default();
        let t0 = Instant::now();
        t.update(&net(1000, 2000), t0);

        let t1 = t0 + Duration::from_secs(1);
        assert_eq!(t.update(&net(10, 20), t1), Rate::Discontinuity);

        let t2 = t1 + Duration::from_secs(1);
        let v = t.update(&net(10 + 1024 * 1024, 20), t2).value().unwrap();
        assert!((v - 1.0).abs() < 1e-9);
        assert!(v >= 0.0);
    }

    #[test]
    fn bandwidth_idempotent_samples_yield_zero_rate() {
        let mut t = BandwidthTracker::default();
        let t0 = Instant::now();
        t.update(&net(5000, 7000), t0);
        let v = t
            .update(&net(5000, 7000), t0 + Duration::from_secs(1))
            .value()
            .unwrap();
        assert_eq!(v, 0.0);
    }

    // ===== Memory =====

    #[test]
    fn memory_usage_from_meminfo_scenario() {
        // MemTotal: 1000 kB, MemAvailable: 400 kB -> 60%
        let mem = MemInfo {
            total_kb: 1000,
            available_kb: 400,
        };
        let v = memory_usage_percent(&mem).unwrap();
        assert!((v - 60.0).abs() < 1e-9);
    }

    #[test]
    fn memory_usage_zero_total_is_invalid() {
        let mem = MemInfo {
            total_kb: 0,
            available_kb: 0,
        };
        assert_eq!(memory_usage_percent(&mem), None);
    }

    #[test]
    fn memory_usage_available_above_total_clamps_to_zero() {
        let mem = MemInfo {
            total_kb: 1000,
            available_kb: 1500,
        };
        assert_eq!(memory_usage_percent(&mem), Some(0.0));
    }

    // ===== helpers =====

    #[test]
    fn du64_detects_regression() {
        assert_eq!(du64(10, 5), Some(5));
        assert_eq!(du64(5, 5), Some(0));
        assert_eq!(du64(4, 5), None);
    }
}
