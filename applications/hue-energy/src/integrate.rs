//! Forward integration of fleet power into a cumulative energy counter.
//!
//! The power measured now is applied uniformly over the whole window since the
//! last stored record. After long outages this over- or under-counts, since
//! the draw during the gap was never observed.

use chrono::{DateTime, Utc};

/// Latest cumulative reading in the store, in watt-seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRecord {
    pub timestamp: DateTime<Utc>,
    pub energy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integration {
    pub energy: f64,
    pub elapsed_secs: i64,
    /// The last record lies in the future; elapsed time was clamped to zero.
    pub clock_anomaly: bool,
}

/// Whole seconds from `last` to `now`, never negative. The flag reports
/// whether clamping was needed.
pub fn elapsed_seconds(last: DateTime<Utc>, now: DateTime<Utc>) -> (i64, bool) {
    let secs = (now - last).num_seconds();
    if secs < 0 {
        (0, true)
    } else {
        (secs, false)
    }
}

pub fn integrate(last_energy: f64, total_watts: f64, elapsed_secs: i64) -> f64 {
    last_energy + total_watts * elapsed_secs.max(0) as f64
}

/// Compute the next cumulative value. Without a prior record the result is a
/// zero baseline: energy is only accumulated from a known reference point.
pub fn next_energy(
    last: Option<&EnergyRecord>,
    total_watts: f64,
    now: DateTime<Utc>,
) -> Integration {
    match last {
        None => Integration {
            energy: 0.0,
            elapsed_secs: 0,
            clock_anomaly: false,
        },
        Some(record) => {
            let (elapsed_secs, clock_anomaly) = elapsed_seconds(record.timestamp, now);
            Integration {
                energy: integrate(record.energy, total_watts, elapsed_secs),
                elapsed_secs,
                clock_anomaly,
            }
        }
    }
}
