//! In-memory mock filesystem for testing collectors without real `/proc`.
//!
//! `MockFs` simulates a filesystem in memory, allowing tests to run on
//! macOS and in CI environments without Linux.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// A healthy idle-ish system with all five counter sources present.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 5000 85000 1000 100 200 0
cpu0 2500 125 1250 21250 250 25 50 0
cpu1 2500 125 1250 21250 250 25 50 0
cpu2 2500 125 1250 21250 250 25 50 0
cpu3 2500 125 1250 21250 250 25 50 0
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 12345 100 987654 4000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 12000 90 950000 3900 6500 45 450000 2900 0 3900 7800 0 0 0 0
 259       0 nvme0n1 50000 10 2000000 900 40000 5 1600000 800 0 1500 1700 0 0 0 0
",
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678    9876    0    0    0     0          0         0 12345678    9876    0    0    0     0       0          0
  eth0: 987654321  654321    5   10    0     0          0         0 123456789  543210    2    5    0     0       0          0
",
        );
        fs.add_file(
            "/proc/vmstat",
            "\
nr_free_pages 2048000
pgpgin 123456
pgpgout 654321
pswpin 100
pswpout 200
pgfault 999999
pgmajfault 1234
",
        );
        fs
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}
