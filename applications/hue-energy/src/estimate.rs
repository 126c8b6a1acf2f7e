//! Brightness to power conversion and fleet-wide aggregation.
//!
//! LED drivers draw closer to a square law than a linear one over the
//! brightness range, on top of a fixed standby floor:
//!
//! `power = (idle + (bri / 254)^2 * (full - idle)) * multiplier`

use crate::error::{AppError, Result};
use crate::model::{DeviceCurve, PowerModel};
use crate::normalize::{NormalizedSample, MAX_BRIGHTNESS};

/// Estimated draw of one light.
#[derive(Debug, Clone, PartialEq)]
pub struct DevicePower {
    pub key: String,
    pub model: String,
    pub brightness: u8,
    pub curve: DeviceCurve,
    pub watts: f64,
}

/// Sum of all lights that could be estimated, plus the ones that could not.
#[derive(Debug, Default)]
pub struct FleetPower {
    pub total_watts: f64,
    pub devices: Vec<DevicePower>,
    pub failures: Vec<AppError>,
}

pub fn power_at(curve: &DeviceCurve, brightness: u8) -> f64 {
    let level = f64::from(brightness.min(MAX_BRIGHTNESS)) / f64::from(MAX_BRIGHTNESS);
    let raw = curve.idle + level.powi(2) * (curve.full - curve.idle);
    raw * curve.multiplier
}

pub fn estimate(model: &PowerModel, sample: &NormalizedSample) -> Result<DevicePower> {
    let curve = model.lookup(&sample.model, &sample.key)?;
    Ok(DevicePower {
        key: sample.key.clone(),
        model: sample.model.clone(),
        brightness: sample.brightness,
        watts: power_at(&curve, sample.brightness),
        curve,
    })
}

/// Devices that cannot be estimated (unknown model, override below the
/// model's idle power) are left out of the total and returned in `failures`;
/// they never count as zero silently.
pub fn aggregate(model: &PowerModel, samples: &[NormalizedSample]) -> FleetPower {
    let mut fleet = FleetPower::default();
    for sample in samples {
        match estimate(model, sample) {
            Ok(device) => {
                fleet.total_watts += device.watts;
                fleet.devices.push(device);
            }
            Err(e) => fleet.failures.push(e),
        }
    }
    fleet
}
