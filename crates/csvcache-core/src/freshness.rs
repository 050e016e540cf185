//! Daily refresh window.
//!
//! Cached data becomes stale once a day, at a fixed local time in a fixed
//! UTC offset. All comparisons happen in that offset so the daily boundary
//! does not depend on the host's timezone.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CsvCacheError;

/// Default cutoff, 13:30 local time.
const DEFAULT_CUTOFF_HOUR: u32 = 13;
const DEFAULT_CUTOFF_MINUTE: u32 = 30;

/// Default zone, UTC+7.
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessWindow {
    pub cutoff: NaiveTime,
    pub utc_offset_secs: i32,
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self {
            cutoff: NaiveTime::from_hms_opt(DEFAULT_CUTOFF_HOUR, DEFAULT_CUTOFF_MINUTE, 0)
                .unwrap_or(NaiveTime::MIN),
            utc_offset_secs: DEFAULT_UTC_OFFSET_HOURS * 3600,
        }
    }
}

impl FreshnessWindow {
    /// Build a window from `"HH:MM"` and a whole-hour UTC offset.
    pub fn parse(cutoff: &str, utc_offset_hours: i32) -> Result<Self, CsvCacheError> {
        let cutoff = NaiveTime::parse_from_str(cutoff.trim(), "%H:%M")
            .map_err(|e| CsvCacheError::time(format!("invalid cutoff {:?}: {}", cutoff, e)))?;
        let window = Self {
            cutoff,
            utc_offset_secs: utc_offset_hours * 3600,
        };
        window.zone()?;
        Ok(window)
    }

    fn zone(&self) -> Result<FixedOffset, CsvCacheError> {
        FixedOffset::east_opt(self.utc_offset_secs).ok_or_else(|| {
            CsvCacheError::time(format!("invalid UTC offset {}s", self.utc_offset_secs))
        })
    }

    /// The cutoff instant on `now`'s calendar date in the window's zone.
    pub fn cutoff_for(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, CsvCacheError> {
        let zone = self.zone()?;
        let local = now.with_timezone(&zone).date_naive().and_time(self.cutoff);
        zone.from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| CsvCacheError::time(format!("no unique instant for {}", local)))
    }

    /// True once `now` is past today's cutoff and the last fetch is not.
    ///
    /// A missing `last_fetch` counts as the unix epoch. Both bounds are
    /// exclusive: at exactly the cutoff nothing is due, and a fetch recorded
    /// at exactly the cutoff satisfies the window.
    pub fn should_refresh(
        &self,
        now: DateTime<Utc>,
        last_fetch: Option<DateTime<Utc>>,
    ) -> Result<bool, CsvCacheError> {
        let cutoff = self.cutoff_for(now)?;
        let fetched_before_cutoff = last_fetch.map_or(true, |last| last < cutoff);
        Ok(now > cutoff && fetched_before_cutoff)
    }

    /// The first cutoff instant strictly after `now`.
    pub fn next_refresh_after(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, CsvCacheError> {
        let cutoff = self.cutoff_for(now)?;
        if now < cutoff {
            Ok(cutoff)
        } else {
            Ok(cutoff + Duration::days(1))
        }
    }
}

/// Convert a stored unix timestamp back to an instant.
pub fn from_unix_secs(secs: i64) -> Result<DateTime<Utc>, CsvCacheError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CsvCacheError::time(format!("timestamp out of range: {}", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a UTC instant from a wall-clock time in UTC+7.
    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_default_window() {
        let w = FreshnessWindow::default();
        assert_eq!(w.cutoff, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(w.utc_offset_secs, 7 * 3600);
    }

    #[test]
    fn test_before_cutoff_never_refreshes() {
        let w = FreshnessWindow::default();
        let now = local(2024, 5, 10, 13, 29, 59);
        assert!(!w.should_refresh(now, None).unwrap());
        assert!(!w.should_refresh(now, Some(local(2024, 5, 1, 0, 0, 0))).unwrap());
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let w = FreshnessWindow::default();
        let cutoff = local(2024, 5, 10, 13, 30, 0);
        let yesterday = local(2024, 5, 9, 20, 0, 0);
        assert!(!w.should_refresh(cutoff, Some(yesterday)).unwrap());
        assert!(w.should_refresh(cutoff + Duration::seconds(1), Some(yesterday)).unwrap());
        // a fetch recorded exactly at the cutoff counts as done
        assert!(!w.should_refresh(cutoff + Duration::hours(1), Some(cutoff)).unwrap());
        assert!(w
            .should_refresh(cutoff + Duration::hours(1), Some(cutoff - Duration::seconds(1)))
            .unwrap());
    }

    #[test]
    fn test_once_per_day() {
        let w = FreshnessWindow::default();
        let first_check = local(2024, 5, 10, 14, 0, 0);
        assert!(w.should_refresh(first_check, Some(local(2024, 5, 10, 9, 0, 0))).unwrap());
        // fetch recorded at first_check; later checks the same day stay quiet
        for hour in [15, 18, 23] {
            let later = local(2024, 5, 10, hour, 0, 0);
            assert!(!w.should_refresh(later, Some(first_check)).unwrap());
        }
    }

    #[test]
    fn test_day_rollover() {
        let w = FreshnessWindow::default();
        // late fetch yesterday does not block today's refresh
        let late_yesterday = local(2024, 5, 9, 23, 50, 0);
        assert!(!w.should_refresh(local(2024, 5, 10, 0, 10, 0), Some(late_yesterday)).unwrap());
        assert!(w.should_refresh(local(2024, 5, 10, 13, 31, 0), Some(late_yesterday)).unwrap());
    }

    #[test]
    fn test_zone_not_host_local() {
        let w = FreshnessWindow::default();
        // 06:45 UTC is 13:45 in UTC+7
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 6, 45, 0).unwrap();
        assert!(w.should_refresh(now, None).unwrap());
        // 17:00 UTC on the 10th is already 00:00 on the 11th in UTC+7
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 17, 0, 0).unwrap();
        assert_eq!(w.cutoff_for(now).unwrap(), local(2024, 5, 11, 13, 30, 0));
    }

    #[test]
    fn test_next_refresh_after() {
        let w = FreshnessWindow::default();
        assert_eq!(
            w.next_refresh_after(local(2024, 5, 10, 9, 0, 0)).unwrap(),
            local(2024, 5, 10, 13, 30, 0)
        );
        assert_eq!(
            w.next_refresh_after(local(2024, 5, 10, 13, 30, 0)).unwrap(),
            local(2024, 5, 11, 13, 30, 0)
        );
    }

    #[test]
    fn test_invalid_offset_is_an_error() {
        let w = FreshnessWindow {
            cutoff: NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
            utc_offset_secs: 30 * 3600,
        };
        let err = w.should_refresh(Utc::now(), None).unwrap_err();
        assert_eq!(err.code(), "time_error");
        assert!(FreshnessWindow::parse("13:30", 30).is_err());
        assert!(FreshnessWindow::parse("25:00", 7).is_err());
        assert_eq!(FreshnessWindow::parse("08:15", -5).unwrap().utc_offset_secs, -5 * 3600);
    }

    #[test]
    fn test_from_unix_secs() {
        assert_eq!(from_unix_secs(0).unwrap(), Utc.timestamp_opt(0, 0).unwrap());
        assert!(from_unix_secs(i64::MAX).is_err());
    }
}
