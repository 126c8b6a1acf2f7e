use crate::bridge::HueBridge;
use crate::config::Config;
use crate::error::Result;
use crate::estimate::aggregate;
use crate::influx::InfluxStore;
use crate::integrate::{next_energy, EnergyRecord, Integration};
use crate::model::PowerModel;
use crate::normalize::normalize_all;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

/// Outcome of one completed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub total_watts: f64,
    pub estimated: usize,
    pub excluded: usize,
    pub previous: Option<EnergyRecord>,
    pub integration: Integration,
}

/// One sampling pass: bridge -> estimate -> last energy -> integrate -> write.
pub struct EnergyJob {
    bridge: HueBridge,
    store: InfluxStore,
    model: PowerModel,
}

impl EnergyJob {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            bridge: HueBridge::new(&cfg.bridge)?,
            store: InfluxStore::new(&cfg.store)?,
            model: cfg.power_model()?,
        })
    }

    /// Bridge and store-read failures abort before anything is written. A light
    /// that cannot be estimated is only dropped from the total.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let lights = self.bridge.lights().await?;
        let samples = normalize_all(&lights);
        info!(lights = samples.len(), "read light states from bridge");

        match self.store.write_brightness(&samples).await {
            Ok(true) => info!(lights = samples.len(), "stored raw brightness"),
            Ok(false) => {}
            Err(e) => error!(error = %e, "failed to store raw brightness"),
        }

        let fleet = aggregate(&self.model, &samples);
        for d in &fleet.devices {
            info!(
                light = %d.key,
                model = %d.model,
                bri = d.brightness,
                idle = d.curve.idle,
                full = d.curve.full,
                mult = d.curve.multiplier,
                power = d.watts,
                "estimated light power"
            );
        }
        for e in &fleet.failures {
            error!(error = %e, "light excluded from total power");
        }

        let previous = self.store.last_energy().await?;
        let integration = next_energy(previous.as_ref(), fleet.total_watts, now);

        match &previous {
            None => info!("no previous energy record; storing zero baseline"),
            Some(last) if integration.clock_anomaly => warn!(
                last = %last.timestamp,
                now = %now,
                "last energy record is in the future; not accumulating"
            ),
            Some(_) => {}
        }

        self.store.write_energy(integration.energy).await?;
        info!(
            total_power = fleet.total_watts,
            elapsed_secs = integration.elapsed_secs,
            energy = integration.energy,
            "stored cumulative energy"
        );

        Ok(RunReport {
            total_watts: fleet.total_watts,
            estimated: fleet.devices.len(),
            excluded: fleet.failures.len(),
            previous,
            integration,
        })
    }
}
