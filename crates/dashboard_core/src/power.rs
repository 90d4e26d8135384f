//! crates/dashboard_core/src/power.rs
//!
//! Power-outage schedule helpers: hourly status codes, half-hour block
//! merging and normalization of a fetched schedule.

use crate::domain::{HalfHour, HourSlot, HourStatus, LightData, PowerBlock};

pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Day '{day}' has {found} hourly entries, expected 24")]
    WrongHourCount { day: String, found: usize },
    #[error("Unknown hour status '{0}'")]
    UnknownStatus(String),
}

impl HourStatus {
    /// Parses the canonical wire code (`on`, `off`, `off-first-half`, `off-second-half`).
    pub fn from_code(code: &str) -> Result<Self, ScheduleError> {
        match code.trim() {
            "on" => Ok(HourStatus::On),
            "off" => Ok(HourStatus::Off),
            "off-first-half" => Ok(HourStatus::OffFirstHalf),
            "off-second-half" => Ok(HourStatus::OffSecondHalf),
            other => Err(ScheduleError::UnknownStatus(other.to_string())),
        }
    }

    /// Maps the CSS classes of a schedule table cell on the scraped page.
    /// Cells without an outage marker mean power is on.
    pub fn from_css_class(class: Option<&str>) -> Self {
        let class = class.unwrap_or_default();
        if class.contains("cell-first-half") {
            HourStatus::OffFirstHalf
        } else if class.contains("cell-second-half") {
            HourStatus::OffSecondHalf
        } else if class.contains("cell-scheduled") {
            HourStatus::Off
        } else {
            HourStatus::On
        }
    }

    /// Availability of the (first, second) half of the hour.
    fn halves(self) -> (bool, bool) {
        match self {
            HourStatus::On => (true, true),
            HourStatus::Off => (false, false),
            HourStatus::OffFirstHalf => (false, true),
            HourStatus::OffSecondHalf => (true, false),
        }
    }
}

/// Label of the form `"08-09"` for the given hour.
pub fn time_slot_label(hour: usize) -> String {
    format!("{:02}-{:02}", hour, hour + 1)
}

/// Converts a list of hourly codes into labelled slots.
pub fn day_schedule(hours: &[HourStatus]) -> Vec<HourSlot> {
    hours
        .iter()
        .enumerate()
        .map(|(hour, status)| HourSlot {
            time_slot: time_slot_label(hour),
            status: *status,
        })
        .collect()
}

fn half_hour_offset(index: usize) -> HalfHour {
    if index % 2 == 0 {
        HalfHour::OnTheHour
    } else {
        HalfHour::HalfPast
    }
}

fn close_block(start: usize, last: usize) -> PowerBlock {
    // The block ends where the half-hour after `last` begins.
    let end = last + 1;
    let mut block = PowerBlock {
        start_hour: (start / 2) as u8,
        start_offset: half_hour_offset(start),
        end_hour: (end / 2) as u8,
        end_offset: half_hour_offset(end),
    };
    let overshoots = block.end_hour as usize > HOURS_PER_DAY
        || (block.end_hour as usize == HOURS_PER_DAY && block.end_offset == HalfHour::HalfPast);
    if overshoots {
        block.end_hour = HOURS_PER_DAY as u8;
        block.end_offset = HalfHour::OnTheHour;
    }
    block
}

/// Merges hourly statuses into the minimal ordered list of contiguous
/// "power on" intervals.
pub fn merge_blocks(hours: &[HourStatus]) -> Vec<PowerBlock> {
    let mut on: Vec<usize> = hours
        .iter()
        .enumerate()
        .flat_map(|(hour, status)| {
            let (first, second) = status.halves();
            [(hour * 2, first), (hour * 2 + 1, second)]
        })
        .filter_map(|(index, is_on)| is_on.then_some(index))
        .collect();
    on.sort_unstable();

    let mut blocks = Vec::new();
    let mut run: Option<(usize, usize)> = None;

    for index in on {
        run = match run {
            Some((start, last)) if index == last + 1 => Some((start, index)),
            Some((start, last)) => {
                blocks.push(close_block(start, last));
                Some((index, index))
            }
            None => Some((index, index)),
        };
    }
    if let Some((start, last)) = run {
        blocks.push(close_block(start, last));
    }

    blocks
}

/// Validates a fetched schedule and fills in the derived fields: every week
/// day must carry exactly 24 hourly codes and gets its merged power blocks.
pub fn normalize_light_data(mut data: LightData) -> Result<LightData, ScheduleError> {
    for day in &mut data.week_schedule.days {
        if day.hours.len() != HOURS_PER_DAY {
            return Err(ScheduleError::WrongHourCount {
                day: day.day_name.clone(),
                found: day.hours.len(),
            });
        }
        day.blocks = merge_blocks(&day.hours);
    }
    for (label, slots) in [("today", &data.today), ("tomorrow", &data.tomorrow)] {
        // An empty day means the provider has not published it yet.
        if !slots.is_empty() && slots.len() != HOURS_PER_DAY {
            return Err(ScheduleError::WrongHourCount {
                day: label.to_string(),
                found: slots.len(),
            });
        }
    }
    Ok(data)
}
