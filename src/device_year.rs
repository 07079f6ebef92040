//! Memoized classification entry point.

use std::sync::OnceLock;

use crate::classify::{classify, CombinationStrategy, YearClass};
use crate::probe::{HardwareInfo, RawMetrics, SysfsProbe};

/// A probe plus a combination strategy, with a write-once result cache.
///
/// The first [`get`](DeviceYear::get) probes the hardware and classifies;
/// the answer is then fixed for the lifetime of the value and returned
/// verbatim even if a later probe would see different signals. Concurrent
/// first calls run the probe-and-classify sequence exactly once, every
/// caller observes the same fully-built result, and calls after
/// initialization are lock-free.
pub struct DeviceYear<P = SysfsProbe> {
    probe: P,
    strategy: CombinationStrategy,
    cached: OnceLock<YearClass>,
}

impl DeviceYear<SysfsProbe> {
    /// Classifier over the live system with the default strategy.
    pub fn new() -> Self {
        Self::with_probe(SysfsProbe::new(), CombinationStrategy::RamPrimary)
    }
}

impl Default for DeviceYear<SysfsProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HardwareInfo> DeviceYear<P> {
    /// Classifier over an arbitrary signal source.
    pub fn with_probe(probe: P, strategy: CombinationStrategy) -> Self {
        DeviceYear {
            probe,
            strategy,
            cached: OnceLock::new(),
        }
    }

    /// The combination strategy this classifier applies.
    pub fn strategy(&self) -> CombinationStrategy {
        self.strategy
    }

    /// The memoized year class, probing on the first call.
    pub fn get(&self) -> YearClass {
        *self
            .cached
            .get_or_init(|| classify(&RawMetrics::capture(&self.probe), self.strategy))
    }

    /// A fresh, uncached metrics snapshot from the underlying probe.
    pub fn metrics(&self) -> RawMetrics {
        RawMetrics::capture(&self.probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Signal source whose answers change after the first capture, to make
    /// any accidental re-probe visible.
    struct ShiftingProbe {
        captures: AtomicU32,
    }

    impl ShiftingProbe {
        fn new() -> Self {
            ShiftingProbe {
                captures: AtomicU32::new(0),
            }
        }
    }

    impl HardwareInfo for ShiftingProbe {
        fn core_count(&self) -> Option<u32> {
            match self.captures.fetch_add(1, Ordering::SeqCst) {
                0 => Some(4),
                _ => None,
            }
        }

        fn max_clock_khz(&self) -> Option<u32> {
            None
        }

        fn total_ram_bytes(&self) -> Option<u64> {
            None
        }
    }

    #[test]
    fn test_get_is_sticky() {
        let device = DeviceYear::with_probe(ShiftingProbe::new(), CombinationStrategy::Median);
        assert_eq!(device.get(), YearClass::Y2012);
        // The second probe would answer all-unknown; the cache wins.
        assert_eq!(device.get(), YearClass::Y2012);
        assert_eq!(device.probe.captures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_calls_probe_once() {
        let device = DeviceYear::with_probe(ShiftingProbe::new(), CombinationStrategy::Median);
        let results: Vec<YearClass> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| device.get())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|&r| r == YearClass::Y2012));
        assert_eq!(device.probe.captures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_injected_metrics_bypass_files() {
        let fixed = RawMetrics {
            cores: Some(4),
            max_clock_khz: Some(2_457_600),
            total_ram_bytes: Some(1_946_939_392),
        };
        let device = DeviceYear::with_probe(fixed, CombinationStrategy::Median);
        assert_eq!(device.strategy(), CombinationStrategy::Median);
        assert_eq!(device.get(), YearClass::Y2013);
        assert_eq!(device.metrics(), fixed);
    }

    #[test]
    fn test_metrics_snapshot_is_not_cached() {
        let device = DeviceYear::with_probe(ShiftingProbe::new(), CombinationStrategy::Median);
        assert_eq!(device.metrics().cores, Some(4));
        assert_eq!(device.metrics().cores, None);
    }
}
