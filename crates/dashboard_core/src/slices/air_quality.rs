//! crates/dashboard_core/src/slices/air_quality.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::aqi::calculate_from_sensor_data;
use crate::domain::AirQualityReading;
use crate::messages::DATA_ERROR;
use crate::slices::FetchOutcome;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQualityState {
    pub reading: Option<AirQualityReading>,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_error: bool,
    pub is_fetching: bool,
}

pub struct AirQualitySlice<'a> {
    store: &'a Store,
}

impl<'a> AirQualitySlice<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Fetches the latest sensor values and replaces the cached reading.
    pub async fn fetch(&self) -> FetchOutcome {
        let started = self.store.update(|s| {
            let aq = &mut s.air_quality;
            if aq.is_fetching {
                return false;
            }
            aq.is_fetching = true;
            aq.is_error = false;
            true
        });
        if !started {
            debug!("fetch_air_quality already in flight");
            return FetchOutcome::Skipped;
        }

        let services = self.store.services();
        let result = services.air_quality.latest_reading().await;

        let reading = match result {
            Ok(sensor) => calculate_from_sensor_data(&sensor).map_err(|e| e.to_string()),
            Err(e) => Err(e.message().unwrap_or(DATA_ERROR).to_string()),
        };

        match reading {
            Ok(reading) => {
                let now = services.clock.now();
                self.store.update(|s| {
                    let aq = &mut s.air_quality;
                    aq.reading = Some(reading);
                    aq.timestamp = Some(now);
                    aq.is_fetching = false;
                });
                FetchOutcome::Fetched
            }
            Err(message) => {
                error!("fetch_air_quality: {}", message);
                self.store.update(|s| {
                    let aq = &mut s.air_quality;
                    aq.is_error = true;
                    aq.is_fetching = false;
                });
                FetchOutcome::Failed
            }
        }
    }
}
