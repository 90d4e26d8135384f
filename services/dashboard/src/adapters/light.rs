//! services/dashboard/src/adapters/light.rs
//!
//! This module implements the `LightService` port by reading the grid
//! operator's outage schedule for one address.
//!
//! The schedule document mirrors the operator's page: each table cell carries
//! the CSS class that marks it as a full or half-hour outage. A load either
//! completes every step within its time limit or is retried from scratch.

use async_trait::async_trait;
use chrono::Utc;
use dashboard_core::{
    domain::{HourStatus, LightData, WeekDay, WeekSchedule},
    ports::{LightService, PortError, PortResult},
    power::day_schedule,
};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

pub const LIGHT_SCRAPE_ATTEMPTS: usize = 5;
pub const PAGE_LOAD_LIMIT: Duration = Duration::from_secs(15);
pub const BODY_READ_LIMIT: Duration = Duration::from_millis(2500);

#[derive(Debug, Deserialize)]
struct ScheduleDocument {
    #[serde(default)]
    queue_number: String,
    #[serde(default)]
    last_update: String,
    today: DayTable,
    #[serde(default)]
    tomorrow: Option<DayTable>,
    #[serde(default)]
    week: Vec<WeekRow>,
}

#[derive(Debug, Deserialize)]
struct DayTable {
    #[serde(default)]
    date: String,
    cells: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct WeekRow {
    day_name: String,
    #[serde(default)]
    row_class: Option<String>,
    #[serde(default)]
    first_cell_class: Option<String>,
    cells: Vec<Option<String>>,
}

fn statuses(cells: &[Option<String>]) -> Vec<HourStatus> {
    cells
        .iter()
        .map(|class| HourStatus::from_css_class(class.as_deref()))
        .collect()
}

/// Translates the operator's Ukrainian day names; anything else is kept.
fn day_name_en(day_name: &str) -> String {
    let english = match day_name.trim().to_lowercase().as_str() {
        "понеділок" => "Monday",
        "вівторок" => "Tuesday",
        "середа" => "Wednesday",
        "четвер" => "Thursday",
        "п'ятниця" | "п’ятниця" => "Friday",
        "субота" => "Saturday",
        "неділя" => "Sunday",
        _ => return day_name.trim().to_string(),
    };
    english.to_string()
}

fn to_light_data(doc: ScheduleDocument, street: &str, house_number: &str) -> LightData {
    let (tomorrow, tomorrow_date) = match doc.tomorrow {
        Some(table) => (day_schedule(&statuses(&table.cells)), table.date),
        None => (Vec::new(), String::new()),
    };

    let days = doc
        .week
        .into_iter()
        .map(|row| WeekDay {
            day_name_en: day_name_en(&row.day_name),
            is_today: row
                .first_cell_class
                .as_deref()
                .is_some_and(|c| c.contains("current-day")),
            is_yesterday: row
                .row_class
                .as_deref()
                .is_some_and(|c| c.contains("yesterday-row")),
            hours: statuses(&row.cells),
            blocks: Vec::new(),
            day_name: row.day_name,
        })
        .collect();

    LightData {
        street: street.to_string(),
        house_number: house_number.to_string(),
        queue_number: doc.queue_number.trim().to_string(),
        last_update: doc.last_update.trim().to_string(),
        today: day_schedule(&statuses(&doc.today.cells)),
        tomorrow,
        today_date: doc.today.date.trim().to_string(),
        tomorrow_date: tomorrow_date.trim().to_string(),
        week_schedule: WeekSchedule {
            days,
            timestamp: Utc::now(),
        },
    }
}

/// Runs `attempt` up to `attempts` times and returns the first success, or the
/// error of the last attempt.
async fn with_attempts<T, F, Fut>(attempts: usize, mut attempt: F) -> PortResult<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    let mut last_error = PortError::Unexpected("No attempt was made".to_string());
    for number in 1..=attempts {
        match attempt(number).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Schedule attempt {}/{} failed: {}", number, attempts, e);
                last_error = e;
            }
        }
    }
    Err(last_error)
}

pub struct LightScheduleAdapter {
    client: reqwest::Client,
    url: String,
    street: String,
    house_number: String,
}

impl LightScheduleAdapter {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        street: Option<String>,
        house_number: Option<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            street: street.unwrap_or_default(),
            house_number: house_number.unwrap_or_default(),
        }
    }

    async fn load_once(&self) -> PortResult<LightData> {
        let request = self
            .client
            .get(&self.url)
            .query(&[("street", &self.street), ("house", &self.house_number)])
            .send();
        let response = tokio::time::timeout(PAGE_LOAD_LIMIT, request)
            .await
            .map_err(|_| PortError::Timeout("page load".to_string()))?
            .map_err(|e| PortError::Unexpected(format!("Schedule request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "Schedule page responded with status {}",
                response.status()
            )));
        }

        let body = tokio::time::timeout(BODY_READ_LIMIT, response.text())
            .await
            .map_err(|_| PortError::Timeout("schedule body".to_string()))?
            .map_err(|e| PortError::Unexpected(format!("Schedule body unreadable: {}", e)))?;

        let doc: ScheduleDocument = serde_json::from_str(&body)
            .map_err(|e| PortError::InvalidData(format!("Unexpected schedule layout: {}", e)))?;
        Ok(to_light_data(doc, &self.street, &self.house_number))
    }
}

#[async_trait]
impl LightService for LightScheduleAdapter {
    async fn fetch_schedule(&self) -> PortResult<LightData> {
        let data = with_attempts(LIGHT_SCRAPE_ATTEMPTS, |_| self.load_once()).await?;
        info!(
            "Light schedule loaded: queue {}, {} week days",
            data.queue_number,
            data.week_schedule.days.len()
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cells(off_hours: &[usize]) -> serde_json::Value {
        (0..24)
            .map(|h| {
                if off_hours.contains(&h) {
                    serde_json::json!("cell-scheduled")
                } else {
                    serde_json::Value::Null
                }
            })
            .collect()
    }

    #[test]
    fn test_document_to_light_data() {
        let mut week_cells = cells(&[0, 1]);
        week_cells[5] = serde_json::json!("cell-first-half");
        let doc: ScheduleDocument = serde_json::from_value(serde_json::json!({
            "queue_number": " 3.1 ",
            "last_update": "16.10.2026 07:45",
            "today": {"date": "16.10.26", "cells": cells(&[8, 9])},
            "week": [
                {"day_name": "Четвер", "row_class": "yesterday-row", "cells": cells(&[])},
                {"day_name": "П'ятниця", "first_cell_class": "current-day", "cells": week_cells},
            ],
        }))
        .unwrap();

        let data = to_light_data(doc, "Main", "1");
        assert_eq!(data.queue_number, "3.1");
        assert_eq!(data.today.len(), 24);
        assert_eq!(data.today[8].status, HourStatus::Off);
        assert_eq!(data.today[8].time_slot, "08-09");
        assert_eq!(data.today[10].status, HourStatus::On);
        assert!(data.tomorrow.is_empty());

        let days = &data.week_schedule.days;
        assert_eq!(days[0].day_name_en, "Thursday");
        assert!(days[0].is_yesterday && !days[0].is_today);
        assert_eq!(days[1].day_name_en, "Friday");
        assert!(days[1].is_today);
        assert_eq!(days[1].hours[5], HourStatus::OffFirstHalf);
    }

    #[test]
    fn test_unknown_day_name_is_kept() {
        assert_eq!(day_name_en(" Holiday "), "Holiday");
        assert_eq!(day_name_en("неділя"), "Sunday");
    }

    #[tokio::test]
    async fn test_attempts_stop_at_first_success() {
        let calls = AtomicUsize::new(0);
        let result = with_attempts(5, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(PortError::Timeout("page load".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_last_failure_kind_is_reported() {
        let result: PortResult<()> = with_attempts(LIGHT_SCRAPE_ATTEMPTS, |n| async move {
            if n == LIGHT_SCRAPE_ATTEMPTS {
                Err(PortError::Timeout("schedule body".to_string()))
            } else {
                Err(PortError::Unexpected("boom".to_string()))
            }
        })
        .await;
        assert_eq!(result, Err(PortError::Timeout("schedule body".to_string())));
    }
}
