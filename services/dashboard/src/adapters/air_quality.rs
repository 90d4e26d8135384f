//! services/dashboard/src/adapters/air_quality.rs
//!
//! This module implements the `AirQualityService` port against the
//! sensor.community per-sensor endpoint.

use async_trait::async_trait;
use dashboard_core::{
    domain::SensorReading,
    ports::{AirQualityService, PortError, PortResult},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One measurement batch as delivered by the sensor feed. The newest batch
/// comes first.
#[derive(Debug, Deserialize)]
struct SensorItem {
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    sensordatavalues: Vec<SensorValue>,
}

#[derive(Debug, Deserialize)]
struct SensorValue {
    value_type: String,
    value: String,
}

pub struct SensorCommunityAdapter {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SensorCommunityAdapter {
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

fn concentration(values: &[SensorValue], value_type: &str) -> PortResult<Option<f64>> {
    let Some(entry) = values.iter().find(|v| v.value_type == value_type) else {
        return Ok(None);
    };
    entry.value.trim().parse::<f64>().map(Some).map_err(|_| {
        PortError::InvalidData(format!(
            "Sensor value {} is not a number: '{}'",
            value_type, entry.value
        ))
    })
}

/// Picks the newest batch and maps `P2` to PM2.5 and `P1` to PM10.
fn parse_items(items: Vec<SensorItem>) -> PortResult<SensorReading> {
    let latest = items
        .into_iter()
        .next()
        .ok_or_else(|| PortError::InvalidData("API returned empty array".to_string()))?;

    let pm25 = concentration(&latest.sensordatavalues, "P2")?;
    let pm10 = concentration(&latest.sensordatavalues, "P1")?;
    if pm25.is_none() && pm10.is_none() {
        return Err(PortError::InvalidData(
            "Missing PM entries in data".to_string(),
        ));
    }

    Ok(SensorReading {
        pm25,
        pm10,
        timestamp: latest.timestamp,
    })
}

#[async_trait]
impl AirQualityService for SensorCommunityAdapter {
    async fn latest_reading(&self) -> PortResult<SensorReading> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Sensor request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "API responded with status {}",
                response.status()
            )));
        }

        let items: Vec<SensorItem> = response
            .json()
            .await
            .map_err(|e| PortError::InvalidData(format!("Malformed sensor response: {}", e)))?;
        debug!("Sensor feed returned {} batches", items.len());

        parse_items(items)
    }
}
