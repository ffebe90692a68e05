//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string
//! inputs and carry no state between calls.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Aggregate CPU time counters from the first `cpu` line of `/proc/stat`.
///
/// All fields are cumulative jiffies since boot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

/// Parses the aggregate `cpu` line of `/proc/stat`.
///
/// The line looks like `cpu  100 0 50 850 0 0 0 0` (tag, then at least
/// eight space-separated counters).
pub fn parse_cpu_times(content: &str) -> Result<CpuTimes, ParseError> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| ParseError::new("missing aggregate cpu line"))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|s| s.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ParseError::new("non-numeric field in cpu line"))?;

    if fields.len() < 8 {
        return Err(ParseError::new(format!(
            "short cpu line: expected 8+ fields, got {}",
            fields.len()
        )));
    }

    Ok(CpuTimes {
        user: fields[0],
        nice: fields[1],
        system: fields[2],
        idle: fields[3],
        iowait: fields[4],
        irq: fields[5],
        softirq: fields[6],
        steal: fields[7],
    })
}

/// Scheduler counters from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct KernelStat {
    /// Total context switches since boot (`ctxt` line).
    pub ctxt: u64,
    /// Total processes forked since boot (`processes` line).
    pub processes: u64,
}

/// Parses the `ctxt` and `processes` lines of `/proc/stat`.
pub fn parse_kernel_stat(content: &str) -> Result<KernelStat, ParseError> {
    let mut ctxt = None;
    let mut processes = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("ctxt") => ctxt = parts.next().and_then(|s| s.parse().ok()),
            Some("processes") => processes = parts.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }

    match (ctxt, processes) {
        (Some(ctxt), Some(processes)) => Ok(KernelStat { ctxt, processes }),
        (None, _) => Err(ParseError::new("missing ctxt line")),
        (_, None) => Err(ParseError::new("missing processes line")),
    }
}

/// Memory totals from `/proc/meminfo`, in kilobytes.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub total_kb: u64,
    pub available_kb: u64,
}

/// Parses `/proc/meminfo` content.
///
/// Only `MemTotal` and `MemAvailable` are needed; both must be present.
/// Lines have the form `Key:   value kB`.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let parse_kb = |line: &str| -> Option<u64> {
        line.split_whitespace().nth(1).and_then(|s| s.parse().ok())
    };

    let mut total = None;
    let mut available = None;

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            total = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            available = parse_kb(line);
        }
        if total.is_some() && available.is_some() {
            break;
        }
    }

    match (total, available) {
        (Some(total_kb), Some(available_kb)) => Ok(MemInfo {
            total_kb,
            available_kb,
        }),
        (None, _) => Err(ParseError::new("missing MemTotal")),
        (_, None) => Err(ParseError::new("missing MemAvailable")),
    }
}

/// I/O counters for one block device from `/proc/diskstats`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskCounters {
    /// Reads completed successfully.
    pub reads: u64,
    /// Sectors read.
    pub read_sectors: u64,
    /// Writes completed.
    pub writes: u64,
    /// Sectors written.
    pub write_sectors: u64,
}

/// Parses `/proc/diskstats`, selecting the line for `device` by name.
///
/// Each line is `major minor name reads r_merged r_sectors r_ms writes
/// w_merged w_sectors ...`; fields are at fixed positions after the name.
pub fn parse_diskstats(content: &str, device: &str) -> Result<DiskCounters, ParseError> {
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.get(2) != Some(&device) {
            continue;
        }
        if fields.len() < 10 {
            return Err(ParseError::new(format!(
                "short diskstats line for {}: {} fields",
                device,
                fields.len()
            )));
        }
        let field = |idx: usize, name: &str| -> Result<u64, ParseError> {
            fields[idx]
                .parse()
                .map_err(|_| ParseError::new(format!("invalid {} for {}", name, device)))
        };
        return Ok(DiskCounters {
            reads: field(3, "reads")?,
            read_sectors: field(5, "read_sectors")?,
            writes: field(7, "writes")?,
            write_sectors: field(9, "write_sectors")?,
        });
    }

    Err(ParseError::new(format!(
        "device {} not found in diskstats",
        device
    )))
}

/// Byte counters summed over all network interfaces from `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Parses `/proc/net/dev` content.
///
/// The first two lines are headers. Every following line is
/// `iface: rx_bytes rx_packets errs drop fifo frame compressed multicast
/// tx_bytes ...`; receive and transmit bytes are summed over all interfaces.
pub fn parse_net_dev(content: &str) -> Result<NetCounters, ParseError> {
    let mut totals = NetCounters::default();
    let mut seen = false;

    for line in content.lines().skip(2) {
        let Some((_iface, rest)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(ParseError::new("short interface line in net/dev"));
        }
        let rx: u64 = fields[0]
            .parse()
            .map_err(|_| ParseError::new("invalid rx_bytes"))?;
        let tx: u64 = fields[8]
            .parse()
            .map_err(|_| ParseError::new("invalid tx_bytes"))?;
        totals.rx_bytes += rx;
        totals.tx_bytes += tx;
        seen = true;
    }

    if !seen {
        return Err(ParseError::new("no interface lines in net/dev"));
    }

    Ok(totals)
}

/// Page fault counters from `/proc/vmstat`.
#[derive(Debug, Clone, Default)]
pub struct VmStat {
    /// Minor page faults (`pgfault`).
    pub pgfault: u64,
    /// Major page faults (`pgmajfault`).
    pub pgmajfault: u64,
}

/// Parses the `pgfault` and `pgmajfault` lines of `/proc/vmstat`.
pub fn parse_vmstat(content: &str) -> Result<VmStat, ParseError> {
    let mut pgfault = None;
    let mut pgmajfault = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("pgfault") => pgfault = parts.next().and_then(|s| s.parse().ok()),
            Some("pgmajfault") => pgmajfault = parts.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }

    match (pgfault, pgmajfault) {
        (Some(pgfault), Some(pgmajfault)) => Ok(VmStat {
            pgfault,
            pgmajfault,
        }),
        (None, _) => Err(ParseError::new("missing pgfault line")),
        (_, None) => Err(ParseError::new("missing pgmajfault line")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "\
cpu  100 0 50 850 0 0 0 0
cpu0 25 0 13 212 0 0 0 0
intr 12345 0 0
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
";

    #[test]
    fn cpu_times_parsed_from_aggregate_line() {
        let cpu = parse_cpu_times(STAT).unwrap();
        assert_eq!(cpu.user, 100);
        assert_eq!(cpu.nice, 0);
        assert_eq!(cpu.system, 50);
        assert_eq!(cpu.idle, 850);
        assert_eq!(cpu.steal, 0);
    }

    #[test]
    fn cpu_times_missing_line_is_error() {
        assert!(parse_cpu_times("intr 1 2 3\nctxt 5\n").is_err());
    }

    #[test]
    fn cpu_times_short_line_is_error() {
        assert!(parse_cpu_times("cpu  100 0 50\n").is_err());
    }

    #[test]
    fn kernel_stat_parsed() {
        let stat = parse_kernel_stat(STAT).unwrap();
        assert_eq!(stat.ctxt, 500000);
        assert_eq!(stat.processes, 10000);
    }

    #[test]
    fn kernel_stat_missing_ctxt_is_error() {
        let err = parse_kernel_stat("cpu 1 2 3 4 5 6 7 8\nprocesses 10\n").unwrap_err();
        assert!(err.message.contains("ctxt"));
    }

    #[test]
    fn meminfo_parsed() {
        let content = "MemTotal:       16384000 kB\nMemFree:         8192000 kB\nMemAvailable:   12000000 kB\n";
        let mem = parse_meminfo(content).unwrap();
        assert_eq!(mem.total_kb, 16384000);
        assert_eq!(mem.available_kb, 12000000);
    }

    #[test]
    fn meminfo_missing_available_is_error() {
        let err = parse_meminfo("MemTotal: 1000 kB\n").unwrap_err();
        assert!(err.message.contains("MemAvailable"));
    }

    const DISKSTATS: &str = "\
   8       0 sda 12345 100 987654 4000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 12000 90 950000 3900 6500 45 450000 2900 0 3900 7800 0 0 0 0
 259       0 nvme0n1 50000 10 2000000 900 40000 5 1600000 800 0 1500 1700 0 0 0 0
";

    #[test]
    fn diskstats_selects_device_by_name() {
        let disk = parse_diskstats(DISKSTATS, "sda").unwrap();
        assert_eq!(disk.reads, 12345);
        assert_eq!(disk.read_sectors, 987654);
        assert_eq!(disk.writes, 6789);
        assert_eq!(disk.write_sectors, 456789);
    }

    #[test]
    fn diskstats_exact_name_match_only() {
        // "sda" must not match "sda1"
        let disk = parse_diskstats(DISKSTATS, "nvme0n1").unwrap();
        assert_eq!(disk.read_sectors, 2000000);
    }

    #[test]
    fn diskstats_unknown_device_is_error() {
        let err = parse_diskstats(DISKSTATS, "sdb").unwrap_err();
        assert!(err.message.contains("sdb"));
    }

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678    9876    0    0    0     0          0         0 12345678    9876    0    0    0     0       0          0
  eth0: 987654321  654321    5   10    0     0          0         0 123456789  543210    2    5    0     0       0          0
";

    #[test]
    fn net_dev_sums_all_interfaces() {
        let net = parse_net_dev(NET_DEV).unwrap();
        assert_eq!(net.rx_bytes, 12345678 + 987654321);
        assert_eq!(net.tx_bytes, 12345678 + 123456789);
    }

    #[test]
    fn net_dev_headers_only_is_error() {
        let content = "Inter-| Receive\n face |bytes\n";
        assert!(parse_net_dev(content).is_err());
    }

    #[test]
    fn vmstat_parsed() {
        let content = "nr_free_pages 100\npgpgin 123456\npgfault 999999\npgmajfault 1234\n";
        let vm = parse_vmstat(content).unwrap();
        assert_eq!(vm.pgfault, 999999);
        assert_eq!(vm.pgmajfault, 1234);
    }

    #[test]
    fn vmstat_missing_counter_is_error() {
        assert!(parse_vmstat("pgfault 10\n").is_err());
    }
}
