//! crates/dashboard_core/src/domain.rs
//!
//! Defines the pure, core data structures for the dashboard.
//! These structs are independent of any database or transport format; the
//! serde derives exist only so the store can snapshot them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//=========================================================================================
// Identifiers
//=========================================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// An empty identifier is treated as "missing" by the slice layer.
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a folder as handed out by the document store.
    FolderId
);
string_id!(
    /// Identifier of a note as handed out by the document store.
    NoteId
);
string_id!(
    /// Identifier of the authenticated user owning folders and notes.
    UserId
);
string_id!(FactId);

//=========================================================================================
// Air Quality
//=========================================================================================

/// Raw particulate concentrations (µg/m³) as delivered by the sensor feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub timestamp: String,
}

/// EPA AQI category, ids 1 to 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pollutant::Pm25 => f.write_str("PM2.5"),
            Pollutant::Pm10 => f.write_str("PM10"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub concentration: f64,
    pub aqi: u16,
    pub category: AqiCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAqi {
    pub aqi: u16,
    pub category: AqiCategory,
    pub primary: Pollutant,
}

/// A fully calculated air-quality reading. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm25: Option<PollutantReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<PollutantReading>,
    pub overall: OverallAqi,
    pub timestamp: String,
}

//=========================================================================================
// Facts
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub category: String,
    pub title: String,
}

//=========================================================================================
// Light (power-outage schedule)
//=========================================================================================

/// Power availability within one clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HourStatus {
    On,
    Off,
    /// Power is off during the first half of the hour only.
    OffFirstHalf,
    /// Power is off during the second half of the hour only.
    OffSecondHalf,
}

/// Whether a block boundary sits on the hour or half past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HalfHour {
    OnTheHour,
    HalfPast,
}

impl HalfHour {
    pub fn as_fraction(self) -> f32 {
        match self {
            HalfHour::OnTheHour => 0.0,
            HalfHour::HalfPast => 0.5,
        }
    }
}

/// A contiguous interval during which power is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerBlock {
    pub start_hour: u8,
    pub start_offset: HalfHour,
    pub end_hour: u8,
    pub end_offset: HalfHour,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSlot {
    /// Label such as `"08-09"`.
    pub time_slot: String,
    pub status: HourStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekDay {
    pub day_name: String,
    pub day_name_en: String,
    pub is_today: bool,
    pub is_yesterday: bool,
    /// Exactly 24 hourly codes once normalized.
    pub hours: Vec<HourStatus>,
    /// Merged "power on" intervals, filled during normalization.
    #[serde(default)]
    pub blocks: Vec<PowerBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub days: Vec<WeekDay>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightData {
    pub street: String,
    pub house_number: String,
    pub queue_number: String,
    pub last_update: String,
    pub today: Vec<HourSlot>,
    pub tomorrow: Vec<HourSlot>,
    pub today_date: String,
    pub tomorrow_date: String,
    pub week_schedule: WeekSchedule,
}

//=========================================================================================
// News
//=========================================================================================

/// An article from the paginated NewsData.io feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDataArticle {
    pub article_id: String,
    pub link: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
}

/// One page-set returned by the NewsData.io collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewsDataPage {
    pub articles: Vec<NewsDataArticle>,
    /// Cursor for the following request; `None` when the feed is exhausted.
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HackerNewsArticle {
    pub id: u64,
    pub by: String,
    pub title: String,
    pub url: Option<String>,
    pub score: i64,
    pub time: i64,
    #[serde(default)]
    pub descendants: i64,
}

//=========================================================================================
// Notes & Folders
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl FolderColor {
    pub fn as_str(self) -> &'static str {
        match self {
            FolderColor::Default => "default",
            FolderColor::Red => "red",
            FolderColor::Orange => "orange",
            FolderColor::Yellow => "yellow",
            FolderColor::Green => "green",
            FolderColor::Blue => "blue",
            FolderColor::Purple => "purple",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" | "" => Some(FolderColor::Default),
            "red" => Some(FolderColor::Red),
            "orange" => Some(FolderColor::Orange),
            "yellow" => Some(FolderColor::Yellow),
            "green" => Some(FolderColor::Green),
            "blue" => Some(FolderColor::Blue),
            "purple" => Some(FolderColor::Purple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub title: String,
    pub color: FolderColor,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A note. The same identity may be cached both in the folder-notes list and
/// in the favorites list; the two copies are kept equal by the notes slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub folder_id: FolderId,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub encrypted: bool,
    pub favorite: bool,
}

/// Folder list together with the user's favorite notes, fetched in one call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderListing {
    pub folders: Vec<Folder>,
    pub favorite_notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderUpdate {
    pub title: Option<String>,
    pub color: Option<FolderColor>,
}

//=========================================================================================
// Player
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoopMode {
    #[default]
    Disabled,
    Single,
    All,
}

impl LoopMode {
    /// Cycles Disabled -> Single -> All -> Disabled.
    pub fn next(self) -> Self {
        match self {
            LoopMode::Disabled => LoopMode::Single,
            LoopMode::Single => LoopMode::All,
            LoopMode::All => LoopMode::Disabled,
        }
    }
}

/// Track identifier of the form `<playlist>_<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(playlist_id: &str, index: usize) -> Self {
        Self(format!("{}_{}", playlist_id, index))
    }

    pub fn parse(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The playlist id embedded in the track id prefix.
    pub fn playlist_id(&self) -> &str {
        self.0.split('_').next().unwrap_or_default()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub index: usize,
    pub title: String,
    pub artist: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_playlist_prefix() {
        let id = TrackId::new("1", 3);
        assert_eq!(id.as_str(), "1_3");
        assert_eq!(id.playlist_id(), "1");
        assert_eq!(TrackId::parse("12_0").playlist_id(), "12");
    }

    #[test]
    fn test_loop_mode_cycles() {
        assert_eq!(LoopMode::Disabled.next(), LoopMode::Single);
        assert_eq!(LoopMode::Single.next(), LoopMode::All);
        assert_eq!(LoopMode::All.next(), LoopMode::Disabled);
    }

    #[test]
    fn test_empty_ids_are_missing() {
        assert!(NoteId::new("  ").is_empty());
        assert!(!FolderId::from("abc").is_empty());
    }

    #[test]
    fn test_folder_color_parse() {
        assert_eq!(FolderColor::parse("blue"), Some(FolderColor::Blue));
        assert_eq!(FolderColor::parse(""), Some(FolderColor::Default));
        assert_eq!(FolderColor::parse("magenta"), None);
        assert_eq!(FolderColor::Green.as_str(), "green");
    }

    #[test]
    fn test_hour_status_wire_codes() {
        let json = serde_json::to_string(&HourStatus::OffFirstHalf).unwrap();
        assert_eq!(json, "\"off-first-half\"");
        let parsed: HourStatus = serde_json::from_str("\"off-second-half\"").unwrap();
        assert_eq!(parsed, HourStatus::OffSecondHalf);
    }
}
