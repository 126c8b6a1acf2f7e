use hue_energy::{Config, EnergyJob};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg_path =
        std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.example.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(
        models = cfg.models.len(),
        overrides = cfg.overrides.len(),
        multipliers = cfg.multipliers.len(),
        "loaded config"
    );

    let job = EnergyJob::new(&cfg)?;

    // Run failures are reported through the log only; the next tick retries.
    if let Err(e) = job.run(chrono::Utc::now()).await {
        error!(error = %e, "energy run failed");
    }

    Ok(())
}
