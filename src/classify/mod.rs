//! Year classification engine.
//!
//! Maps each raw hardware signal to the calendar year in which flagship
//! devices shipped comparable specs, then merges the per-metric years into
//! a single ordinal bucket under the configured combination strategy.
//!
//! The cut-off tables are kept as plain `const` data so each ladder can be
//! audited and tested independently of the combination logic. The three
//! strategies evolved at different times and deliberately keep their own
//! tables; they can disagree on the same snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::probe::RawMetrics;

const MB: u64 = 1024 * 1024;
const MHZ_IN_KHZ: u32 = 1000;

/// Ordinal performance bucket: the year in which a top-of-the-line device
/// had specs comparable to this one.
///
/// This is not the device's release year. A budget phone released in 2012
/// with 2010-flagship internals classifies as 2010.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum YearClass {
    /// Not enough signals to classify.
    Unknown,
    Y2008,
    Y2009,
    Y2010,
    Y2011,
    Y2012,
    Y2013,
    Y2014,
    Y2015,
    Y2016,
}

impl YearClass {
    /// Every known bucket in ascending order, `Unknown` excluded.
    pub const ALL: [YearClass; 9] = [
        YearClass::Y2008,
        YearClass::Y2009,
        YearClass::Y2010,
        YearClass::Y2011,
        YearClass::Y2012,
        YearClass::Y2013,
        YearClass::Y2014,
        YearClass::Y2015,
        YearClass::Y2016,
    ];

    /// The calendar year, or `None` for `Unknown`.
    pub const fn year(self) -> Option<i32> {
        match self {
            YearClass::Unknown => None,
            YearClass::Y2008 => Some(2008),
            YearClass::Y2009 => Some(2009),
            YearClass::Y2010 => Some(2010),
            YearClass::Y2011 => Some(2011),
            YearClass::Y2012 => Some(2012),
            YearClass::Y2013 => Some(2013),
            YearClass::Y2014 => Some(2014),
            YearClass::Y2015 => Some(2015),
            YearClass::Y2016 => Some(2016),
        }
    }

    /// Bucket for a calendar year; anything outside the known range
    /// collapses to `Unknown`.
    pub const fn from_year(year: i32) -> YearClass {
        match year {
            2008 => YearClass::Y2008,
            2009 => YearClass::Y2009,
            2010 => YearClass::Y2010,
            2011 => YearClass::Y2011,
            2012 => YearClass::Y2012,
            2013 => YearClass::Y2013,
            2014 => YearClass::Y2014,
            2015 => YearClass::Y2015,
            2016 => YearClass::Y2016,
            _ => YearClass::Unknown,
        }
    }
}

impl fmt::Display for YearClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year() {
            Some(year) => write!(f, "{}", year),
            None => write!(f, "unknown"),
        }
    }
}

/// Policy for merging the per-metric year estimates into one bucket.
///
/// Fixed per deployment at construction time, not per call; the variants
/// produce different answers for the same snapshot on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinationStrategy {
    /// Median of the core, clock, and RAM years, rounding an even-sized set
    /// toward the lower of the two central values.
    Median,
    /// Mean of the clock and RAM years under the octa-core-aware tables,
    /// consulting the core-count year only when both are missing.
    Average,
    /// Resolve through a single RAM-keyed ladder, with clock speed and core
    /// count splitting specific bands; RAM-less snapshots fall back to the
    /// median policy.
    RamPrimary,
}

impl fmt::Display for CombinationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Median => write!(f, "median"),
            Self::Average => write!(f, "average"),
            Self::RamPrimary => write!(f, "ram-primary"),
        }
    }
}

impl FromStr for CombinationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "median" => Ok(Self::Median),
            "average" => Ok(Self::Average),
            "ram-primary" => Ok(Self::RamPrimary),
            other => Err(format!(
                "unknown strategy {:?} (expected median, average, or ram-primary)",
                other
            )),
        }
    }
}

/// Upper-bound-inclusive step table; the last entry is the catch-all.
type Ladder<T> = &'static [(T, YearClass)];

fn step<T: PartialOrd + Copy>(value: T, ladder: Ladder<T>) -> YearClass {
    for &(bound, year) in ladder {
        if value <= bound {
            return year;
        }
    }
    // Unreachable while the tables keep their MAX sentinel rows.
    YearClass::Unknown
}

const CORE_LADDER: Ladder<u32> = &[
    (1, YearClass::Y2008),
    (3, YearClass::Y2011),
    (u32::MAX, YearClass::Y2012),
];

/// Cut-offs carry roughly 20 MHz of slop: nominally "1.5 GHz" parts
/// commonly report 1,512,000 kHz.
const CLOCK_LADDER: Ladder<u32> = &[
    (528 * MHZ_IN_KHZ, YearClass::Y2008),
    (620 * MHZ_IN_KHZ, YearClass::Y2009),
    (1020 * MHZ_IN_KHZ, YearClass::Y2010),
    (1220 * MHZ_IN_KHZ, YearClass::Y2011),
    (1520 * MHZ_IN_KHZ, YearClass::Y2012),
    (2020 * MHZ_IN_KHZ, YearClass::Y2013),
    (u32::MAX, YearClass::Y2014),
];

const RAM_LADDER: Ladder<u64> = &[
    (192 * MB, YearClass::Y2008),
    (290 * MB, YearClass::Y2009),
    (512 * MB, YearClass::Y2010),
    (1024 * MB, YearClass::Y2011),
    (1536 * MB, YearClass::Y2012),
    (2048 * MB, YearClass::Y2013),
    (u64::MAX, YearClass::Y2014),
];

// Octa-core-aware tables used by the average strategy. Big.LITTLE parts
// pushed flagship core counts to 8 while per-core clocks stayed modest, so
// the core ladder extends upward and high-core-count parts get their own
// two-step clock table.

const CORE_LADDER_OCTA: Ladder<u32> = &[
    (1, YearClass::Y2008),
    (3, YearClass::Y2011),
    (4, YearClass::Y2014),
    (u32::MAX, YearClass::Y2015),
];

const CLOCK_LADDER_OCTA: Ladder<u32> = &[
    (528 * MHZ_IN_KHZ, YearClass::Y2008),
    (620 * MHZ_IN_KHZ, YearClass::Y2009),
    (1020 * MHZ_IN_KHZ, YearClass::Y2010),
    (1220 * MHZ_IN_KHZ, YearClass::Y2011),
    (1520 * MHZ_IN_KHZ, YearClass::Y2012),
    (2020 * MHZ_IN_KHZ, YearClass::Y2013),
    (2200 * MHZ_IN_KHZ, YearClass::Y2014),
    (u32::MAX, YearClass::Y2015),
];

const CLOCK_LADDER_OCTA_HIGH_CORE: Ladder<u32> = &[
    (1520 * MHZ_IN_KHZ, YearClass::Y2014),
    (u32::MAX, YearClass::Y2015),
];

const RAM_LADDER_OCTA: Ladder<u64> = &[
    (192 * MB, YearClass::Y2008),
    (290 * MB, YearClass::Y2009),
    (512 * MB, YearClass::Y2010),
    (1024 * MB, YearClass::Y2011),
    (1536 * MB, YearClass::Y2012),
    (2048 * MB, YearClass::Y2013),
    (u64::MAX, YearClass::Y2015),
];

/// Year for the number of CPU cores.
pub fn core_count_year(cores: Option<u32>) -> YearClass {
    match cores {
        Some(n) if n >= 1 => step(n, CORE_LADDER),
        _ => YearClass::Unknown,
    }
}

/// Year for the maximum CPU clock speed in kHz.
pub fn clock_speed_year(khz: Option<u32>) -> YearClass {
    match khz {
        Some(k) => step(k, CLOCK_LADDER),
        None => YearClass::Unknown,
    }
}

/// Year for the total RAM in bytes.
pub fn ram_year(bytes: Option<u64>) -> YearClass {
    match bytes {
        Some(b) if b > 0 => step(b, RAM_LADDER),
        _ => YearClass::Unknown,
    }
}

fn core_count_year_octa(cores: Option<u32>) -> YearClass {
    match cores {
        Some(n) if n >= 1 => step(n, CORE_LADDER_OCTA),
        _ => YearClass::Unknown,
    }
}

fn clock_speed_year_octa(khz: Option<u32>, cores: Option<u32>) -> YearClass {
    let khz = match khz {
        Some(k) => k,
        None => return YearClass::Unknown,
    };
    if cores.map_or(false, |c| c >= 8) {
        step(khz, CLOCK_LADDER_OCTA_HIGH_CORE)
    } else {
        step(khz, CLOCK_LADDER_OCTA)
    }
}

fn ram_year_octa(bytes: Option<u64>) -> YearClass {
    match bytes {
        Some(b) if b > 0 => step(b, RAM_LADDER_OCTA),
        _ => YearClass::Unknown,
    }
}

/// Classify a metrics snapshot under the given strategy.
///
/// Total over every combination of known and unknown signals: an unknown
/// metric is simply left out of the merge, and an all-unknown snapshot
/// classifies as [`YearClass::Unknown`].
pub fn classify(metrics: &RawMetrics, strategy: CombinationStrategy) -> YearClass {
    match strategy {
        CombinationStrategy::Median => classify_median(metrics),
        CombinationStrategy::Average => classify_average(metrics),
        CombinationStrategy::RamPrimary => classify_ram_primary(metrics),
    }
}

fn classify_median(metrics: &RawMetrics) -> YearClass {
    let mut years: Vec<i32> = [
        core_count_year(metrics.cores),
        clock_speed_year(metrics.max_clock_khz),
        ram_year(metrics.total_ram_bytes),
    ]
    .iter()
    .filter_map(|y| y.year())
    .collect();
    if years.is_empty() {
        return YearClass::Unknown;
    }
    years.sort_unstable();
    let mid = years.len() / 2;
    let year = if years.len() % 2 == 1 {
        years[mid]
    } else {
        // Even count rounds toward the lower central value: {2012, 2013}
        // merges to 2012, never 2012.5.
        years[mid - 1] + (years[mid] - years[mid - 1]) / 2
    };
    YearClass::from_year(year)
}

fn classify_average(metrics: &RawMetrics) -> YearClass {
    let years: Vec<i32> = [
        clock_speed_year_octa(metrics.max_clock_khz, metrics.cores),
        ram_year_octa(metrics.total_ram_bytes),
    ]
    .iter()
    .filter_map(|y| y.year())
    .collect();
    if years.is_empty() {
        // The core count alone says little about a device; it only breaks
        // a total signal blackout.
        return core_count_year_octa(metrics.cores);
    }
    let sum: i32 = years.iter().sum();
    YearClass::from_year(sum / years.len() as i32)
}

fn classify_ram_primary(metrics: &RawMetrics) -> YearClass {
    let ram = match metrics.total_ram_bytes {
        Some(b) => b,
        None => return classify_median(metrics),
    };
    // An unknown auxiliary signal resolves each split band to its lower
    // year.
    if ram <= 768 * MB {
        return if metrics.cores.map_or(true, |c| c <= 1) {
            YearClass::Y2009
        } else {
            YearClass::Y2010
        };
    }
    if ram <= 1024 * MB {
        return if metrics.max_clock_khz.map_or(true, |k| k < 1300 * MHZ_IN_KHZ) {
            YearClass::Y2011
        } else {
            YearClass::Y2012
        };
    }
    if ram <= 1536 * MB {
        return if metrics.max_clock_khz.map_or(true, |k| k < 1800 * MHZ_IN_KHZ) {
            YearClass::Y2012
        } else {
            YearClass::Y2013
        };
    }
    if ram <= 2048 * MB {
        return YearClass::Y2013;
    }
    if ram <= 3 * 1024 * MB {
        return YearClass::Y2014;
    }
    if ram <= 5 * 1024 * MB {
        YearClass::Y2015
    } else {
        YearClass::Y2016
    }
}
