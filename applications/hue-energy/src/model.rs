//! Per-model calibration table with per-device adjustments.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Empirical power draw of one hardware model, in watts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerCurve {
    /// Standby draw at zero effective brightness.
    pub idle: f64,
    /// Draw at maximum brightness.
    pub full: f64,
}

impl PowerCurve {
    pub fn new(idle: f64, full: f64) -> Self {
        Self { idle, full }
    }

    fn validate(&self, model: &str) -> Result<()> {
        if !self.idle.is_finite() || !self.full.is_finite() {
            return Err(AppError::Config(format!(
                "model '{}': power values must be finite",
                model
            )));
        }
        if self.idle < 0.0 {
            return Err(AppError::Config(format!(
                "model '{}': idle power must be non-negative, got {}",
                model, self.idle
            )));
        }
        if self.full < self.idle {
            return Err(AppError::Config(format!(
                "model '{}': full power {} is below idle power {}",
                model, self.full, self.idle
            )));
        }
        Ok(())
    }
}

/// The curve that applies to one specific device after overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCurve {
    pub idle: f64,
    pub full: f64,
    pub multiplier: f64,
}

/// Immutable lookup table built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct PowerModel {
    curves: BTreeMap<String, PowerCurve>,
    overrides: HashMap<String, f64>,
    multipliers: HashMap<String, f64>,
}

impl PowerModel {
    /// Validates every curve and per-device value. A device key may carry a
    /// full-power override or a multiplier, not both.
    pub fn new(
        curves: BTreeMap<String, PowerCurve>,
        overrides: BTreeMap<String, f64>,
        multipliers: BTreeMap<String, f64>,
    ) -> Result<Self> {
        for (model, curve) in &curves {
            curve.validate(model)?;
        }

        let overrides = normalize_keys("overrides", overrides)?;
        let multipliers = normalize_keys("multipliers", multipliers)?;

        if let Some(key) = overrides.keys().find(|k| multipliers.contains_key(*k)) {
            return Err(AppError::Config(format!(
                "device '{}' has both a full-power override and a multiplier; use one",
                key
            )));
        }

        Ok(Self {
            curves,
            overrides,
            multipliers,
        })
    }

    pub fn curve(&self, model: &str) -> Option<&PowerCurve> {
        self.curves.get(model)
    }

    pub fn full_override(&self, key: &str) -> Option<f64> {
        self.overrides.get(key).copied()
    }

    pub fn multiplier(&self, key: &str) -> f64 {
        self.multipliers.get(key).copied().unwrap_or(1.0)
    }

    /// Resolve the effective curve for a device of the given model. An
    /// override below the model's idle power is rejected, since the device's
    /// model is only known here.
    pub fn lookup(&self, model: &str, key: &str) -> Result<DeviceCurve> {
        let curve = self.curve(model).ok_or_else(|| AppError::UnknownModel {
            key: key.to_string(),
            model: model.to_string(),
        })?;

        let full = match self.full_override(key) {
            Some(full) if full < curve.idle => {
                return Err(AppError::Config(format!(
                    "overrides['{}'] = {} is below idle power {} of model '{}'",
                    key, full, curve.idle, model
                )));
            }
            Some(full) => full,
            None => curve.full,
        };

        Ok(DeviceCurve {
            idle: curve.idle,
            full,
            multiplier: self.multiplier(key),
        })
    }
}

fn normalize_keys(table: &str, values: BTreeMap<String, f64>) -> Result<HashMap<String, f64>> {
    let mut out = HashMap::with_capacity(values.len());
    for (key, value) in values {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::Config(format!(
                "{}['{}'] must be a non-negative number, got {}",
                table, key, value
            )));
        }
        let lower = key.to_lowercase();
        if out.insert(lower.clone(), value).is_some() {
            return Err(AppError::Config(format!(
                "{}: device '{}' is listed more than once (keys are case-insensitive)",
                table, lower
            )));
        }
    }
    Ok(out)
}
