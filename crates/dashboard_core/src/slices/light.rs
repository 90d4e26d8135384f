//! crates/dashboard_core/src/slices/light.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::LightData;
use crate::messages::DATA_ERROR;
use crate::power::normalize_light_data;
use crate::slices::FetchOutcome;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightState {
    pub data: Option<LightData>,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_error: bool,
    pub is_fetching: bool,
    pub is_initialized: bool,
}

pub struct LightSlice<'a> {
    store: &'a Store,
}

impl<'a> LightSlice<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Fetches the power-outage schedule and stores it with merged blocks.
    pub async fn fetch(&self) -> FetchOutcome {
        let started = self.store.update(|s| {
            let light = &mut s.light;
            if light.is_fetching {
                return false;
            }
            light.is_fetching = true;
            light.is_error = false;
            true
        });
        if !started {
            debug!("fetch_light already in flight");
            return FetchOutcome::Skipped;
        }

        let services = self.store.services();
        let schedule = match services.light.fetch_schedule().await {
            Ok(data) => normalize_light_data(data).map_err(|e| e.to_string()),
            Err(e) => Err(e.message().unwrap_or(DATA_ERROR).to_string()),
        };

        match schedule {
            Ok(data) => {
                let now = services.clock.now();
                self.store.update(|s| {
                    let light = &mut s.light;
                    light.data = Some(data);
                    light.timestamp = Some(now);
                    light.is_fetching = false;
                    light.is_initialized = true;
                });
                FetchOutcome::Fetched
            }
            Err(message) => {
                error!("fetch_light: {}", message);
                self.store.update(|s| {
                    s.light.is_error = true;
                    s.light.is_fetching = false;
                });
                FetchOutcome::Failed
            }
        }
    }

    pub fn reset_initialized(&self) {
        self.store.update(|s| s.light.is_initialized = false);
    }
}
