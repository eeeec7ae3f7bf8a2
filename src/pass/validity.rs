//! Pass validity window.

use chrono::{Duration, NaiveDateTime, NaiveTime};

/// When a pass issued at `issued` (local time) stops being valid: `hours`
/// after issue, but never before the same day's `cutoff`.
///
/// `None` if the end of the window is past the last representable instant.
pub fn valid_until(issued: NaiveDateTime, hours: u32, cutoff: NaiveTime) -> Option<NaiveDateTime> {
    let by_duration = issued.checked_add_signed(Duration::hours(i64::from(hours)))?;
    let by_cutoff = issued.date().and_time(cutoff);
    Some(by_duration.max(by_cutoff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn five_pm() -> NaiveTime {
        NaiveTime::from_hms_opt(17, 0, 0).unwrap()
    }

    #[test]
    fn test_early_pass_runs_to_cutoff() {
        assert_eq!(valid_until(at(14, 0), 2, five_pm()), Some(at(17, 0)));
        assert_eq!(valid_until(at(9, 30), 2, five_pm()), Some(at(17, 0)));
    }

    #[test]
    fn test_late_pass_gets_full_duration() {
        assert_eq!(valid_until(at(16, 30), 2, five_pm()), Some(at(18, 30)));
        assert_eq!(valid_until(at(15, 0), 2, five_pm()), Some(at(17, 0)));
    }

    #[test]
    fn test_late_evening_pass_rolls_over_midnight() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 16)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        assert_eq!(valid_until(at(23, 0), 2, five_pm()), Some(expected));
    }

    #[test]
    fn test_window_past_calendar_end_is_none() {
        let last = NaiveDateTime::MAX;
        assert_eq!(valid_until(last, 2, five_pm()), None);
    }
}
