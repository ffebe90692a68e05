//! System collector for gathering raw counters from `/proc/`.

use crate::collector::parser::{
    CpuTimes, DiskCounters, KernelStat, MemInfo, NetCounters, VmStat, parse_cpu_times,
    parse_diskstats, parse_kernel_stat, parse_meminfo, parse_net_dev, parse_vmstat,
};
use crate::collector::traits::FileSystem;
use std::path::Path;

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// I/O error reading a `/proc` file.
    Io(std::io::Error),
    /// Parse error in a `/proc` file.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Collects raw system counters from `/proc/`.
///
/// Stateless: every `collect_*` call opens, reads, and releases its source;
/// no file handle survives across calls and nothing is cached.
pub struct SystemCollector<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> SystemCollector<F> {
    /// Creates a new system collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    fn read(&self, file: &str) -> Result<String, CollectError> {
        let path = format!("{}/{}", self.proc_path, file);
        Ok(self.fs.read_to_string(Path::new(&path))?)
    }

    /// Collects aggregate CPU time counters from `/proc/stat`.
    pub fn collect_cpu_times(&self) -> Result<CpuTimes, CollectError> {
        let content = self.read("stat")?;
        parse_cpu_times(&content).map_err(|e| CollectError::Parse(e.message))
    }

    /// Collects context-switch and fork counters from `/proc/stat`.
    pub fn collect_kernel_stat(&self) -> Result<KernelStat, CollectError> {
        let content = self.read("stat")?;
        parse_kernel_stat(&content).map_err(|e| CollectError::Parse(e.message))
    }

    /// Collects memory totals from `/proc/meminfo`.
    pub fn collect_meminfo(&self) -> Result<MemInfo, CollectError> {
        let content = self.read("meminfo")?;
        parse_meminfo(&content).map_err(|e| CollectError::Parse(e.message))
    }

    /// Collects I/O counters for one block device from `/proc/diskstats`.
    pub fn collect_diskstats(&self, device: &str) -> Result<DiskCounters, CollectError> {
        let content = self.read("diskstats")?;
        parse_diskstats(&content, device).map_err(|e| CollectError::Parse(e.message))
    }

    /// Collects byte counters summed over all interfaces from `/proc/net/dev`.
    pub fn collect_net_dev(&self) -> Result<NetCounters, CollectError> {
        let content = self.read("net/dev")?;
        parse_net_dev(&content).map_err(|e| CollectError::Parse(e.message))
    }

    /// Collects page fault counters from `/proc/vmstat`.
    pub fn collect_vmstat(&self) -> Result<VmStat, CollectError> {
        let content = self.read("vmstat")?;
        parse_vmstat(&content).map_err(|e| CollectError::Parse(e.message))
    }
}
