use crate::config::StoreConfig;
use crate::error::{AppError, Result};
use crate::integrate::EnergyRecord;
use crate::normalize::NormalizedSample;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// InfluxDB 1.x HTTP gateway for the cumulative energy series.
pub struct InfluxStore {
    client: reqwest::Client,
    query_url: String,
    write_url: String,
    database: String,
    measurement: String,
    field: String,
    raw_measurement: Option<String>,
}

impl InfluxStore {
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(cfg.timeout()).build()?;
        let base = cfg.url.trim_end_matches('/');
        Ok(Self {
            client,
            query_url: format!("{}/query", base),
            write_url: format!("{}/write", base),
            database: cfg.database.clone(),
            measurement: cfg.measurement.clone(),
            field: cfg.field.clone(),
            raw_measurement: cfg.raw_measurement.clone(),
        })
    }

    pub fn last_energy_query(&self) -> String {
        format!(
            "SELECT \"{}\" FROM \"{}\" ORDER BY time DESC LIMIT 1",
            self.field, self.measurement
        )
    }

    /// Most recent energy record, or `None` if the series is empty.
    pub async fn last_energy(&self) -> Result<Option<EnergyRecord>> {
        let q = self.last_energy_query();
        debug!(query = %q, "querying last energy");

        let response = self
            .client
            .post(&self.query_url)
            .query(&[("db", self.database.as_str())])
            .form(&[("q", q.as_str())])
            .send()
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            return Err(AppError::StoreRead(format!("status {}: {}", status, body)));
        }
        parse_last_energy(&body)
    }

    pub async fn write_energy(&self, energy: f64) -> Result<()> {
        let line = energy_line(&self.measurement, &self.field, energy);
        self.write(line).await
    }

    /// Write one brightness point per light, if a raw measurement is configured.
    /// Returns whether anything was written.
    pub async fn write_brightness(&self, samples: &[NormalizedSample]) -> Result<bool> {
        let Some(measurement) = &self.raw_measurement else {
            return Ok(false);
        };
        if samples.is_empty() {
            return Ok(false);
        }
        self.write(brightness_lines(measurement, samples)).await?;
        Ok(true)
    }

    async fn write(&self, body: String) -> Result<()> {
        debug!(lines = body.lines().count(), "writing to influx");
        let response = self
            .client
            .post(&self.write_url)
            .query(&[("db", self.database.as_str()), ("precision", "s")])
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::StoreWrite(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::StoreWrite(format!("status {}: {}", status, body)))
    }
}

/// Parse `{results:[{series:[{values:[[time, value]]}]}]}`. A missing or
/// empty series means nothing has been stored yet.
pub fn parse_last_energy(body: &str) -> Result<Option<EnergyRecord>> {
    let resp: QueryResponse = serde_json::from_str(body)
        .map_err(|e| AppError::StoreRead(format!("malformed response: {}", e)))?;

    if let Some(err) = resp.error {
        return Err(AppError::StoreRead(err));
    }
    let statement = resp
        .results
        .into_iter()
        .next()
        .ok_or_else(|| AppError::StoreRead("response has no results".into()))?;
    if let Some(err) = statement.error {
        return Err(AppError::StoreRead(err));
    }

    let Some(row) = statement
        .series
        .into_iter()
        .next()
        .and_then(|s| s.values.into_iter().next())
    else {
        return Ok(None);
    };

    let (ts, value) = match row.as_slice() {
        [ts, value, ..] => (ts, value),
        _ => return Err(AppError::StoreRead(format!("short row: {:?}", row))),
    };

    let ts = ts
        .as_str()
        .ok_or_else(|| AppError::StoreRead(format!("timestamp is not a string: {}", ts)))?;
    let timestamp = DateTime::parse_from_rfc3339(ts)
        .map_err(|e| AppError::StoreRead(format!("bad timestamp '{}': {}", ts, e)))?
        .with_timezone(&Utc);

    let energy = value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::StoreRead(format!("energy is not a number: {}", value)))?;

    Ok(Some(EnergyRecord { timestamp, energy }))
}

/// `<measurement> <field>=<value>`, rounded to whole watt-seconds.
pub fn energy_line(measurement: &str, field: &str, energy: f64) -> String {
    format!(
        "{} {}={:.0}",
        escape_measurement(measurement),
        escape_key(field),
        energy
    )
}

pub fn brightness_lines(measurement: &str, samples: &[NormalizedSample]) -> String {
    let measurement = escape_measurement(measurement);
    samples
        .iter()
        .map(|s| {
            format!(
                "{},light={},model={} bri={}",
                measurement,
                escape_key(&s.key),
                escape_key(&s.model),
                s.brightness
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys also escape `=`.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
