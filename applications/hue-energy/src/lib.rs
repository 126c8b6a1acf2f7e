pub mod bridge;
pub mod config;
pub mod error;
pub mod estimate;
pub mod influx;
pub mod integrate;
pub mod job;
pub mod model;
pub mod normalize;

pub use config::Config;
pub use error::{AppError, Result};
pub use job::{EnergyJob, RunReport};
