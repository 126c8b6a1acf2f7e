use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown model '{model}' for light {key}")]
    UnknownModel { key: String, model: String },
    #[error("Hue bridge unavailable: {0}")]
    TelemetryUnavailable(String),
    #[error("InfluxDB read failed: {0}")]
    StoreRead(String),
    #[error("InfluxDB write failed: {0}")]
    StoreWrite(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
