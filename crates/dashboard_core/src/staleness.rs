//! crates/dashboard_core/src/staleness.rs
//!
//! Refresh policy for cached widget data. A stale cache only *permits* a
//! fetch; nothing here triggers one.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::{AirQualityReading, Folder, LightData};

pub const AIR_QUALITY_REFRESH: Duration = Duration::from_secs(10 * 60);
pub const LIGHT_REFRESH: Duration = Duration::from_secs(30 * 60);
pub const NOTES_REFRESH: Duration = Duration::from_secs(5 * 60);
pub const NEWS_REFRESH: Duration = Duration::from_secs(30 * 60);

/// True when no timestamp is cached or more than `interval` has elapsed.
/// A timestamp in the future counts as fresh.
pub fn is_stale(cached: Option<DateTime<Utc>>, interval: Duration, now: DateTime<Utc>) -> bool {
    let Some(at) = cached else {
        return true;
    };
    match now.signed_duration_since(at).to_std() {
        Ok(elapsed) => elapsed > interval,
        Err(_) => false,
    }
}

pub fn allow_air_quality_update(
    reading: Option<&AirQualityReading>,
    timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    reading.is_none() || is_stale(timestamp, AIR_QUALITY_REFRESH, now)
}

pub fn allow_light_update(
    data: Option<&LightData>,
    timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    data.is_none() || is_stale(timestamp, LIGHT_REFRESH, now)
}

pub fn allow_notes_update(
    folders: &[Folder],
    timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    folders.is_empty() || is_stale(timestamp, NOTES_REFRESH, now)
}

/// Shared by both news feeds. An empty batch counts as missing.
pub fn allow_news_update<T>(
    articles: Option<&[T]>,
    timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    articles.map_or(true, <[T]>::is_empty) || is_stale(timestamp, NEWS_REFRESH, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn chrono_interval(interval: Duration) -> chrono::Duration {
        chrono::Duration::from_std(interval).unwrap()
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 8, minute, 0).unwrap()
    }

    #[test]
    fn test_missing_timestamp_is_stale() {
        assert!(is_stale(None, AIR_QUALITY_REFRESH, at(0)));
    }

    #[test]
    fn test_fresh_then_stale() {
        let updated = at(0);
        assert!(!is_stale(Some(updated), AIR_QUALITY_REFRESH, at(0)));
        assert!(!is_stale(Some(updated), AIR_QUALITY_REFRESH, at(10)));
        assert!(is_stale(Some(updated), AIR_QUALITY_REFRESH, at(11)));
    }

    #[test]
    fn test_interval_is_exclusive() {
        let updated = at(0);
        let exactly = updated + chrono_interval(NOTES_REFRESH);
        assert!(!is_stale(Some(updated), NOTES_REFRESH, exactly));
        assert!(is_stale(
            Some(updated),
            NOTES_REFRESH,
            exactly + chrono::Duration::milliseconds(1)
        ));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        assert!(!is_stale(Some(at(5)), LIGHT_REFRESH, at(0)));
    }

    #[test]
    fn test_domain_helpers_require_cached_data() {
        assert!(allow_air_quality_update(None, Some(at(0)), at(1)));
        assert!(allow_light_update(None, Some(at(0)), at(1)));
        assert!(allow_notes_update(&[], Some(at(0)), at(1)));
        assert!(allow_news_update::<u64>(None, Some(at(0)), at(1)));
        assert!(allow_news_update::<u64>(Some(&[]), Some(at(0)), at(1)));
    }

    #[test]
    fn test_cached_news_waits_for_interval() {
        let cached = [1_u64, 2];
        assert!(!allow_news_update(Some(&cached[..]), Some(at(0)), at(30)));
        assert!(allow_news_update(Some(&cached[..]), Some(at(0)), at(31)));
    }
}
