//! Wall clock and calendar-day normalization in a configured time zone.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;

/// Time zone used for timestamps and for deciding day boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The process's local zone.
    #[default]
    Local,
    /// A named IANA zone.
    Named(Tz),
}

impl Zone {
    /// Resolve an IANA zone name.
    ///
    /// Empty, `"Local"` and unknown names resolve to the local zone.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return Zone::Local;
        }
        match name.parse::<Tz>() {
            Ok(tz) => Zone::Named(tz),
            Err(_) => {
                tracing::warn!(zone = name, "unknown time zone, using local time");
                Zone::Local
            }
        }
    }

    /// Convert a UTC instant into this zone.
    pub fn at(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => instant.with_timezone(&Local).fixed_offset(),
            Zone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }

    /// Name of the zone, `"Local"` for the process zone.
    pub fn name(&self) -> &str {
        match self {
            Zone::Local => "Local",
            Zone::Named(tz) => tz.name(),
        }
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant in the clock's zone.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Calendar day of [`Clock::now`] in the clock's zone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The system wall clock viewed through a [`Zone`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    zone: Zone,
}

impl SystemClock {
    pub fn new(zone: Zone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.zone.at(Utc::now())
    }
}

/// A clock that only moves when told to.
///
/// Useful for exercising day rollover without waiting for midnight.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to `instant`, forwards or backwards.
    pub fn set(&self, instant: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    /// Move the clock by `delta`; negative deltas move it backwards.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_named_zone() {
        assert_eq!(
            Zone::parse("Asia/Shanghai"),
            Zone::Named(chrono_tz::Asia::Shanghai)
        );
        assert_eq!(Zone::parse("UTC"), Zone::Named(chrono_tz::UTC));
    }

    #[test]
    fn test_parse_falls_back_to_local() {
        assert_eq!(Zone::parse(""), Zone::Local);
        assert_eq!(Zone::parse("local"), Zone::Local);
        assert_eq!(Zone::parse("Mars/Olympus_Mons"), Zone::Local);
    }

    #[test]
    fn test_day_depends_on_zone() {
        // 20:00 UTC is already the next day in Shanghai (UTC+8).
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let utc = Zone::Named(chrono_tz::UTC).at(instant);
        let shanghai = Zone::parse("Asia/Shanghai").at(instant);
        assert_eq!(utc.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(
            shanghai.date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_manual_clock() {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 31, 23, 59, 0)
            .unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        clock.advance(TimeDelta::minutes(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
