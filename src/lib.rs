//! Device year class estimation.
//!
//! Buckets the machine this process runs on into the calendar year in which
//! flagship hardware shipped comparable specs, using three signals: CPU core
//! count, maximum CPU clock speed, and total RAM. No model or vendor lookup
//! tables and no benchmarking: the answer is a heuristic ordinal bucket that
//! applications use to scale feature richness down on low-end hardware.
//!
//! The probe tolerates missing and malformed sources; every signal that
//! cannot be read is simply left out of the classification, and a machine
//! with no readable signals classifies as [`YearClass::Unknown`].
//!
//! # Examples
//!
//! ```no_run
//! // Process-wide: probes once, then answers from cache.
//! let year = yearclass::get();
//! println!("year class: {}", year);
//! ```
//!
//! ```
//! use yearclass::{classify, CombinationStrategy, RawMetrics};
//!
//! // Pure classification over injected signals.
//! let metrics = RawMetrics {
//!     cores: Some(4),
//!     max_clock_khz: Some(2_457_600),
//!     total_ram_bytes: Some(1_946_939_392),
//! };
//! let year = classify(&metrics, CombinationStrategy::Median);
//! assert_eq!(year.year(), Some(2013));
//! ```

pub mod classify;
pub mod error;
pub mod probe;

mod device_year;

pub use classify::{classify, CombinationStrategy, YearClass};
pub use device_year::DeviceYear;
pub use probe::{HardwareInfo, RawMetrics, SysfsProbe};

use std::sync::OnceLock;

static SHARED: OnceLock<DeviceYear> = OnceLock::new();

/// Year class of this machine under the default strategy, probed at most
/// once per process.
///
/// The first call blocks on file and OS reads; every later call answers
/// from the process-wide cache, even if the underlying sources would now
/// read differently.
pub fn get() -> YearClass {
    SHARED.get_or_init(DeviceYear::new).get()
}

/// A fresh, uncached snapshot of the raw signals, for callers that want
/// them without classification.
pub fn metrics() -> RawMetrics {
    RawMetrics::capture(&SysfsProbe::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_wide_get_is_stable() {
        let first = get();
        let second = get();
        assert_eq!(first, second);
    }

    #[test]
    fn test_metrics_smoke() {
        // Whatever the host exposes, capturing must not panic.
        let _ = metrics();
    }
}
