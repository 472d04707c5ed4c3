//! Time source for key validity windows.

use chrono::{DateTime, Months, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Add whole calendar years, clamping Feb 29 to Feb 28 when needed.
///
/// Returns `None` only when the result leaves chrono's representable range.
pub fn add_years(start: DateTime<Utc>, years: u32) -> Option<DateTime<Utc>> {
    start.checked_add_months(Months::new(years.checked_mul(12)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_add_years() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let end = add_years(start, 40).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2064, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_add_years_leap_day() {
        let start = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        let end = add_years(start, 1).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_fixed_clock() {
        let instant = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert!(SystemClock.now() > instant);
    }
}
