//! Hardware signal probes.
//!
//! Reads the three raw classification inputs (CPU core count, maximum CPU
//! clock speed, total RAM) from operating-system sources, tolerating
//! absent, unreadable, and malformed data. Every failure degrades to an
//! unknown metric; nothing here returns an error to callers.
//!
//! ## Platform Support
//!
//! - **Linux/Android**: `/sys/devices/system/cpu/*`, `/proc/cpuinfo`,
//!   `/proc/meminfo`, `sysinfo(2)`
//! - **Other platforms**: the sources are absent, so every metric reports
//!   unknown

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Default sysfs directory holding CPU topology entries.
pub const DEFAULT_CPU_SYSFS_ROOT: &str = "/sys/devices/system/cpu";
/// Default procfs root.
pub const DEFAULT_PROCFS_ROOT: &str = "/proc";

/// Per-core frequency pseudo-files are a single short line; 128 bytes is
/// more than any value needs.
const FREQ_READ_LIMIT: usize = 128;
/// The labels we scan `/proc` text sources for sit in the leading lines, so
/// a bounded prefix read is enough.
const PROC_READ_LIMIT: usize = 1024;

/// Raw hardware signals feeding the year classifier.
///
/// A `None` field means the signal could not be obtained; it is excluded
/// from classification rather than coerced to a default. A snapshot is
/// produced fresh on every capture; nothing is cached at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetrics {
    /// Number of CPU cores.
    pub cores: Option<u32>,
    /// Maximum CPU clock speed across all cores, in kHz.
    pub max_clock_khz: Option<u32>,
    /// Total physical RAM in bytes.
    pub total_ram_bytes: Option<u64>,
}

impl RawMetrics {
    /// A snapshot with every signal unknown.
    pub const UNKNOWN: RawMetrics = RawMetrics {
        cores: None,
        max_clock_khz: None,
        total_ram_bytes: None,
    };

    /// Snapshot all three signals from a probe.
    pub fn capture<P: HardwareInfo + ?Sized>(probe: &P) -> Self {
        RawMetrics {
            cores: probe.core_count(),
            max_clock_khz: probe.max_clock_khz(),
            total_ram_bytes: probe.total_ram_bytes(),
        }
    }

    /// Whether no signal at all was obtained.
    pub fn is_empty(&self) -> bool {
        self.cores.is_none() && self.max_clock_khz.is_none() && self.total_ram_bytes.is_none()
    }
}

/// Access to the raw hardware signals.
///
/// The classifier depends only on this trait, so tests inject fixed values
/// instead of reading real files.
pub trait HardwareInfo {
    /// Number of CPU cores, if it can be determined.
    fn core_count(&self) -> Option<u32>;

    /// Maximum CPU clock speed in kHz, if it can be determined.
    fn max_clock_khz(&self) -> Option<u32>;

    /// Total physical RAM in bytes, if it can be determined.
    fn total_ram_bytes(&self) -> Option<u64>;
}

/// A fixed snapshot is itself a signal source.
impl HardwareInfo for RawMetrics {
    fn core_count(&self) -> Option<u32> {
        self.cores
    }

    fn max_clock_khz(&self) -> Option<u32> {
        self.max_clock_khz
    }

    fn total_ram_bytes(&self) -> Option<u64> {
        self.total_ram_bytes
    }
}

/// Probe reading hardware signals from sysfs, procfs, and `sysinfo(2)`.
///
/// Both filesystem roots are configurable so tests can point the probe at a
/// throwaway directory tree instead of the live machine.
#[derive(Debug, Clone)]
pub struct SysfsProbe {
    cpu_root: PathBuf,
    proc_root: PathBuf,
    pinned_single_core: bool,
}

impl SysfsProbe {
    /// Probe over the live system paths.
    pub fn new() -> Self {
        Self::with_roots(DEFAULT_CPU_SYSFS_ROOT, DEFAULT_PROCFS_ROOT)
    }

    /// Probe over custom sysfs and procfs roots.
    pub fn with_roots(cpu_root: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        SysfsProbe {
            cpu_root: cpu_root.into(),
            proc_root: proc_root.into(),
            pinned_single_core: false,
        }
    }

    /// Report a single core without probing the topology sources.
    ///
    /// Some legacy platform tiers never let one application see secondary
    /// cores even on multi-core silicon; a host that knows it runs on such
    /// a tier pins the count instead of probing.
    pub fn pin_single_core(mut self) -> Self {
        self.pinned_single_core = true;
        self
    }

    /// Core count from a kernel cpu-list file (`possible` / `present`).
    fn cores_from_range_file(&self, name: &str) -> Result<u32> {
        let file = fs::File::open(self.cpu_root.join(name))?;
        let mut line = String::new();
        BufReader::new(file).read_line(&mut line)?;
        let line = line.strip_suffix('\n').unwrap_or(&line);
        parse_core_range(line)
            .ok_or_else(|| ProbeError::Parse(format!("bad cpu range {:?} in {}", line, name)))
    }

    /// Core count from the number of `cpuN` entries in the topology
    /// directory.
    fn cores_from_dir_listing(&self) -> Result<u32> {
        let mut count = 0u32;
        for entry in fs::read_dir(&self.cpu_root)? {
            let entry = entry?;
            if is_cpu_entry(&entry.file_name().to_string_lossy()) {
                count += 1;
            }
        }
        if count == 0 {
            return Err(ProbeError::Parse("no cpuN entries in topology directory".into()));
        }
        Ok(count)
    }

    /// Highest `cpuinfo_max_freq` value across the first `cores` cores.
    fn max_freq_from_cpufreq(&self, cores: u32) -> Option<u32> {
        let mut max_khz: Option<u32> = None;
        for core in 0..cores {
            let path = self
                .cpu_root
                .join(format!("cpu{}/cpufreq/cpuinfo_max_freq", core));
            let khz = match read_prefix(&path, FREQ_READ_LIMIT) {
                Ok(buf) => leading_digits(&buf),
                Err(err) => {
                    log::debug!("cpu{} max freq unreadable: {}", core, err);
                    None
                }
            };
            if let Some(khz) = khz {
                if max_khz.map_or(true, |m| khz > m) {
                    max_khz = Some(khz);
                }
            }
        }
        max_khz
    }

    /// Clock speed from the `cpu MHz` field of `/proc/cpuinfo`, in kHz.
    fn max_freq_from_cpuinfo(&self) -> Result<u32> {
        let buf = read_prefix(&self.proc_root.join("cpuinfo"), PROC_READ_LIMIT)?;
        let mhz = labeled_value(&buf, "cpu MHz")
            .ok_or_else(|| ProbeError::Parse("no cpu MHz field in cpuinfo".into()))?;
        u32::try_from(mhz)
            .ok()
            .and_then(|m| m.checked_mul(1000))
            .ok_or_else(|| ProbeError::Parse(format!("cpu MHz value {} out of range", mhz)))
    }

    /// Total RAM from the `MemTotal` field of `/proc/meminfo` (reported in
    /// kB), in bytes.
    fn ram_from_meminfo(&self) -> Result<u64> {
        let buf = read_prefix(&self.proc_root.join("meminfo"), PROC_READ_LIMIT)?;
        labeled_value(&buf, "MemTotal")
            .and_then(|kb| kb.checked_mul(1024))
            .ok_or_else(|| ProbeError::Parse("no MemTotal field in meminfo".into()))
    }
}

impl Default for SysfsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareInfo for SysfsProbe {
    /// Tries `possible`, then `present`, then counting `cpuN` directory
    /// entries; each source failure moves on to the next.
    fn core_count(&self) -> Option<u32> {
        if self.pinned_single_core {
            return Some(1);
        }
        self.cores_from_range_file("possible")
            .or_else(|err| {
                log::debug!("cpu/possible unusable: {}", err);
                self.cores_from_range_file("present")
            })
            .or_else(|err| {
                log::debug!("cpu/present unusable: {}", err);
                self.cores_from_dir_listing()
            })
            .map_err(|err| log::debug!("cpu topology listing unusable: {}", err))
            .ok()
    }

    /// Scans every core's `cpuinfo_max_freq` for the highest value; falls
    /// back to the `cpu MHz` field of `/proc/cpuinfo` when cpufreq yields
    /// nothing. With an unknown core count the per-core scan is skipped
    /// entirely.
    fn max_clock_khz(&self) -> Option<u32> {
        let per_core = self
            .core_count()
            .and_then(|cores| self.max_freq_from_cpufreq(cores));
        if per_core.is_some() {
            return per_core;
        }
        self.max_freq_from_cpuinfo()
            .map_err(|err| log::debug!("cpuinfo clock fallback unusable: {}", err))
            .ok()
    }

    /// Asks the OS via `sysinfo(2)` first; falls back to the `MemTotal`
    /// field of `/proc/meminfo`.
    fn total_ram_bytes(&self) -> Option<u64> {
        match native_total_ram() {
            Ok(bytes) => return Some(bytes),
            Err(err) => log::debug!("native memory query unusable: {}", err),
        }
        self.ram_from_meminfo()
            .map_err(|err| log::debug!("meminfo fallback unusable: {}", err))
            .ok()
    }
}

/// Parse a kernel cpu list of the exact form `0-N` into a core count of
/// `N + 1`.
///
/// Anything else (a single id, a multi-range list, whitespace or trailing
/// characters) is rejected, so a sparse or partial topology is never
/// mistaken for a full count.
fn parse_core_range(s: &str) -> Option<u32> {
    let digits = s.strip_prefix("0-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let top: u32 = digits.parse().ok()?;
    top.checked_add(1)
}

/// Whether a topology directory entry names a core: `cpu` followed only by
/// digits (`cpu0`, `cpu12`; not `cpufreq`, not `cpuidle`).
fn is_cpu_entry(name: &str) -> bool {
    match name.strip_prefix("cpu") {
        Some(rest) => rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Read at most `limit` bytes from the start of a file.
///
/// Pseudo-files report bogus sizes, so this reads into a fixed buffer
/// instead of trusting metadata.
fn read_prefix(path: &Path, limit: usize) -> Result<Vec<u8>> {
    let mut file = fs::File::open(path)?;
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Parse the run of ASCII digits at the start of a buffer.
fn leading_digits(buf: &[u8]) -> Option<u32> {
    let end = buf
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(buf.len());
    if end == 0 {
        return None;
    }
    std::str::from_utf8(&buf[..end]).ok()?.parse().ok()
}

/// Scan a buffer line by line for the first line whose prefix is exactly
/// `label`, then parse the first ASCII-digit run following the label on
/// that same line.
///
/// Returns `None` when no line carries the label, or when the matching
/// line has no digits before its end (later lines are not consulted).
fn labeled_value(buf: &[u8], label: &str) -> Option<u64> {
    for line in buf.split(|&b| b == b'\n') {
        if !line.starts_with(label.as_bytes()) {
            continue;
        }
        let rest = &line[label.len()..];
        let start = rest.iter().position(|b| b.is_ascii_digit())?;
        let digits = &rest[start..];
        let end = digits
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(digits.len());
        return std::str::from_utf8(&digits[..end]).ok()?.parse().ok();
    }
    None
}

/// Total physical memory from the host's native query.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn native_total_ram() -> Result<u64> {
    // SAFETY: sysinfo only writes into the struct we hand it and the
    // all-zeroes bit pattern is a valid libc::sysinfo value.
    let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::sysinfo(&mut info) };
    if rc != 0 {
        return Err(ProbeError::Io(std::io::Error::last_os_error()));
    }
    let total = (info.totalram as u64).saturating_mul(u64::from(info.mem_unit));
    if total == 0 {
        // A zero answer means the call yielded no data; let the meminfo
        // fallback have a try.
        return Err(ProbeError::Parse("sysinfo reported zero total RAM".into()));
    }
    Ok(total)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn native_total_ram() -> Result<u64> {
    Err(ProbeError::Unsupported("sysinfo(2)".into()))
}
