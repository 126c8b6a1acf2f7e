use crate::config::BridgeConfig;
use crate::error::{AppError, Result};
use crate::normalize::{device_key, RawSample, MAX_BRIGHTNESS};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Light {
    uniqueid: String,
    modelid: String,
    state: LightState,
}

#[derive(Debug, Deserialize)]
struct LightState {
    #[serde(default)]
    on: bool,
    bri: Option<u16>,
}

/// Read-only client for the Hue bridge REST API.
pub struct HueBridge {
    client: reqwest::Client,
    lights_url: String,
}

impl HueBridge {
    pub fn new(cfg: &BridgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(cfg.timeout()).build()?;
        let lights_url = format!(
            "{}/api/{}/lights",
            cfg.url.trim_end_matches('/'),
            cfg.username
        );
        Ok(Self { client, lights_url })
    }

    /// Fetch the current state of every paired light.
    pub async fn lights(&self) -> Result<Vec<RawSample>> {
        let response = self
            .client
            .get(&self.lights_url)
            .send()
            .await
            .map_err(|e| AppError::TelemetryUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::TelemetryUnavailable(e.to_string()))?;
        debug!(%status, bytes = body.len(), "bridge responded");

        if !status.is_success() {
            return Err(AppError::TelemetryUnavailable(format!(
                "status {}: {}",
                status, body
            )));
        }
        parse_lights(&body)
    }
}

/// Parse the `/lights` payload, an object keyed by light id. The bridge
/// answers errors (e.g. an unauthorized user) with a 200 and a JSON array.
pub fn parse_lights(body: &str) -> Result<Vec<RawSample>> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| AppError::TelemetryUnavailable(format!("malformed response: {}", e)))?;

    if let Some(items) = json.as_array() {
        let reason = items
            .iter()
            .filter_map(|item| item.pointer("/error/description").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::TelemetryUnavailable(format!(
            "bridge returned error: {}",
            if reason.is_empty() { "unknown" } else { reason.as_str() }
        )));
    }

    let lights: BTreeMap<String, Light> = serde_json::from_value(json)
        .map_err(|e| AppError::TelemetryUnavailable(format!("unexpected light record: {}", e)))?;

    Ok(lights
        .into_values()
        .map(|light| RawSample {
            key: device_key(&light.uniqueid),
            model: light.modelid,
            on: light.state.on,
            brightness: light
                .state
                .bri
                .map(|b| b.min(u16::from(MAX_BRIGHTNESS)) as u8),
        })
        .collect())
}
