//! Trading-day boundaries in exchange-local time.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Splits time into sessions that start at a fixed local time each day.
///
/// A session is named by the local date on which it started, so with a
/// 09:00 reset the instant 08:59 on the 2nd belongs to the session of the
/// 1st. Comparing session dates makes the reset trigger idempotent no
/// matter how many ticks land inside the boundary minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBoundary {
    tz: Tz,
    reset_time: NaiveTime,
}

impl Default for DailyBoundary {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Asia::Seoul,
            reset_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl DailyBoundary {
    pub fn new(tz: Tz, reset_time: NaiveTime) -> Self {
        Self { tz, reset_time }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn reset_time(&self) -> NaiveTime {
        self.reset_time
    }

    /// Session that `now` falls into.
    pub fn session_date(&self, now: DateTime<Utc>) -> NaiveDate {
        let local = now.with_timezone(&self.tz);
        let date = local.date_naive();
        if local.time() >= self.reset_time {
            date
        } else {
            date.checked_sub_days(Days::new(1)).unwrap_or(date)
        }
    }

    /// Whether `now` is in a later session than `last_reset`.
    pub fn is_due(&self, now: DateTime<Utc>, last_reset: NaiveDate) -> bool {
        self.session_date(now) > last_reset
    }

    /// Next reset instant after `now`, for logging.
    pub fn next_reset(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next_day = self.session_date(now).checked_add_days(Days::new(1))?;
        self.tz
            .from_local_datetime(&next_day.and_time(self.reset_time))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_session_date_before_and_after_reset() {
        let boundary = DailyBoundary::default();
        // 08:59 KST on the 2nd
        assert_eq!(boundary.session_date(utc("2024-03-01T23:59:00Z")), date(2024, 3, 1));
        // 09:00 KST on the 2nd
        assert_eq!(boundary.session_date(utc("2024-03-02T00:00:00Z")), date(2024, 3, 2));
    }

    #[test]
    fn test_is_due_once_per_session() {
        let boundary = DailyBoundary::default();
        let last = boundary.session_date(utc("2024-03-01T12:00:00Z"));

        assert!(!boundary.is_due(utc("2024-03-01T23:59:59Z"), last));
        let at_reset = utc("2024-03-02T00:00:05Z");
        assert!(boundary.is_due(at_reset, last));

        let after = boundary.session_date(at_reset);
        assert!(!boundary.is_due(utc("2024-03-02T00:00:30Z"), after));
    }

    #[test]
    fn test_next_reset() {
        let boundary = DailyBoundary::default();
        let next = boundary.next_reset(utc("2024-03-02T03:00:00Z")).unwrap();
        assert_eq!(next, utc("2024-03-03T00:00:00Z"));
    }

    #[test]
    fn test_custom_zone() {
        let boundary = DailyBoundary::new(chrono_tz::UTC, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(boundary.session_date(utc("2024-03-02T00:00:00Z")), date(2024, 3, 2));
        assert_eq!(boundary.session_date(utc("2024-03-01T23:59:59Z")), date(2024, 3, 1));
    }
}
