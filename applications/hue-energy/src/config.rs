use crate::error::{AppError, Result};
use crate::model::{PowerCurve, PowerModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::Path};

const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub store: StoreConfig,
    /// Calibration curve per Hue model id (e.g. "LTW010", "Plug 01")
    pub models: BTreeMap<String, PowerCurve>,
    /// Full-power replacement in watts, keyed by device key
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
    /// Power factor, keyed by device key
    #[serde(default)]
    pub multipliers: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the bridge, e.g. "http://172.16.0.1"
    pub url: String,
    /// Whitelisted API user obtained by pairing with the bridge
    pub username: String,
    pub timeout_secs: Option<u64>,
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of InfluxDB, e.g. "http://localhost:8086"
    pub url: String,
    pub database: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_field")]
    pub field: String,
    /// When set, per-light brightness is also written to this measurement
    pub raw_measurement: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn default_measurement() -> String {
    "energy".into()
}

fn default_field() -> String {
    "huelights".into()
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse.
    /// Afterwards, if HUE_BRIDGE_USERNAME env is set, override `bridge.username`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let expanded = expand_env_placeholders(&raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded)?;

        if let Ok(username) = std::env::var("HUE_BRIDGE_USERNAME") {
            cfg.bridge.username = username;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Build the immutable power model handed to the estimator.
    pub fn power_model(&self) -> Result<PowerModel> {
        PowerModel::new(
            self.models.clone(),
            self.overrides.clone(),
            self.multipliers.clone(),
        )
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("bridge.url", &self.bridge.url),
            ("bridge.username", &self.bridge.username),
            ("store.url", &self.store.url),
            ("store.database", &self.store.database),
            ("store.measurement", &self.store.measurement),
            ("store.field", &self.store.field),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{} cannot be empty", name)));
            }
        }

        if self.models.is_empty() {
            return Err(AppError::Config(
                "config must include at least one model".to_string(),
            ));
        }

        self.power_model().map(|_| ())
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
/// "$$" becomes a literal "$" (escape).
fn expand_env_placeholders(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let close = match it.peek().copied() {
            Some('$') => {
                it.next();
                out.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            _ => {
                out.push('$');
                continue;
            }
        };
        it.next();
        let var = read_until(&mut it, close).ok_or_else(|| {
            AppError::Config(format!("unterminated env placeholder: missing '{}'", close))
        })?;
        let val = std::env::var(&var)
            .map_err(|_| AppError::Config(format!("missing environment variable: {}", var)))?;
        out.push_str(&val);
    }

    Ok(out)
}

/// Read characters until we hit `end`, consuming the closing delimiter.
fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}
