//! Wall-clock time values used by schedule rules.
//!
//! Schedule rules ignore dates entirely: a window is a pair of
//! [`TimeOfDay`] values repeated on a set of weekdays, and it is evaluated
//! against a [`WeeklyInstant`] taken from the local clock.

use std::{fmt, str::FromStr};

use chrono::{
  DateTime, Datelike, NaiveDateTime, NaiveTime, TimeZone, Timelike, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

// ─── TimeOfDay ───────────────────────────────────────────────────────────────

/// Minutes since local midnight, always in `[0, 1440)`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
  pub const MIDNIGHT: Self = Self(0);

  pub fn new(hour: u32, minute: u32) -> Result<Self> {
    if hour >= 24 || minute >= 60 {
      let minutes = hour.saturating_mul(60).saturating_add(minute);
      return Err(Error::InvalidTimeOfDay(minutes));
    }
    Self::from_minutes(hour * 60 + minute)
  }

  pub fn from_minutes(minutes: u32) -> Result<Self> {
    if minutes >= u32::from(MINUTES_PER_DAY) {
      return Err(Error::InvalidTimeOfDay(minutes));
    }
    Ok(Self(minutes as u16))
  }

  /// Reduce `minutes` modulo one day.
  pub const fn wrapping(minutes: u16) -> Self { Self(minutes % MINUTES_PER_DAY) }

  pub fn minutes(self) -> u32 { u32::from(self.0) }

  pub fn hour(self) -> u32 { self.minutes() / 60 }

  pub fn minute(self) -> u32 { self.minutes() % 60 }

  /// Forward distance to `other`, wrapping past midnight. Equal values are
  /// zero minutes apart.
  pub fn minutes_until(self, other: Self) -> u32 {
    let day = u32::from(MINUTES_PER_DAY);
    (other.minutes() + day - self.minutes()) % day
  }
}

impl From<NaiveTime> for TimeOfDay {
  fn from(t: NaiveTime) -> Self { Self((t.hour() * 60 + t.minute()) as u16) }
}

impl From<TimeOfDay> for u32 {
  fn from(t: TimeOfDay) -> Self { t.minutes() }
}

impl TryFrom<u32> for TimeOfDay {
  type Error = Error;

  fn try_from(minutes: u32) -> Result<Self> { Self::from_minutes(minutes) }
}

impl fmt::Display for TimeOfDay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour(), self.minute())
  }
}

impl FromStr for TimeOfDay {
  type Err = Error;

  /// Parses `H:MM` or `HH:MM`.
  fn from_str(s: &str) -> Result<Self> {
    let bad = || Error::ParseTimeOfDay(s.to_owned());
    let (h, m) = s.trim().split_once(':').ok_or_else(bad)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
      return Err(bad());
    }
    let hour: u32 = h.parse().map_err(|_| bad())?;
    let minute: u32 = m.parse().map_err(|_| bad())?;
    Self::new(hour, minute).map_err(|_| bad())
  }
}

// ─── WeeklyInstant ───────────────────────────────────────────────────────────

/// A point in the local week: the weekday plus the time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyInstant {
  pub weekday: Weekday,
  pub time:    TimeOfDay,
}

impl WeeklyInstant {
  pub fn new(weekday: Weekday, time: TimeOfDay) -> Self { Self { weekday, time } }

  /// Project a zoned timestamp onto the week, in that timestamp's own zone.
  pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
    Self::from(dt.naive_local())
  }
}

impl From<NaiveDateTime> for WeeklyInstant {
  fn from(dt: NaiveDateTime) -> Self {
    Self { weekday: dt.weekday(), time: TimeOfDay::from(dt.time()) }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn construct_from_hour_and_minute() {
    let t = TimeOfDay::new(22, 30).unwrap();
    assert_eq!(t.minutes(), 1350);
    assert_eq!(t.hour(), 22);
    assert_eq!(t.minute(), 30);
  }

  #[test]
  fn rejects_out_of_range() {
    assert!(TimeOfDay::from_minutes(1440).is_err());
    assert!(TimeOfDay::new(24, 0).is_err());
    assert!(TimeOfDay::new(9, 60).is_err());
    assert!(TimeOfDay::from_minutes(1439).is_ok());
  }

  #[test]
  fn minutes_until_wraps_past_midnight() {
    let ten_pm = TimeOfDay::new(22, 0).unwrap();
    let six_am = TimeOfDay::new(6, 0).unwrap();
    assert_eq!(ten_pm.minutes_until(six_am), 8 * 60);
    assert_eq!(six_am.minutes_until(ten_pm), 16 * 60);
    assert_eq!(six_am.minutes_until(six_am), 0);
  }

  #[test]
  fn ordering_follows_minutes() {
    assert!(TimeOfDay::new(8, 59).unwrap() < TimeOfDay::new(9, 0).unwrap());
    assert!(TimeOfDay::MIDNIGHT < TimeOfDay::new(0, 1).unwrap());
  }

  #[test]
  fn display_and_parse() {
    let t: TimeOfDay = "7:05".parse().unwrap();
    assert_eq!(t.to_string(), "07:05");
    assert_eq!("23:59".parse::<TimeOfDay>().unwrap().minutes(), 1439);
    assert!("24:00".parse::<TimeOfDay>().is_err());
    assert!("7".parse::<TimeOfDay>().is_err());
    assert!("07:5".parse::<TimeOfDay>().is_err());
  }

  #[test]
  fn serde_uses_minute_count() {
    let t = TimeOfDay::new(1, 1).unwrap();
    assert_eq!(serde_json::to_string(&t).unwrap(), "61");
    assert!(serde_json::from_str::<TimeOfDay>("1440").is_err());
  }

  #[test]
  fn weekly_instant_from_naive_datetime() {
    // 2024-03-01 was a Friday.
    let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
      .unwrap()
      .and_hms_opt(23, 15, 42)
      .unwrap();
    let at = WeeklyInstant::from(dt);
    assert_eq!(at.weekday, Weekday::Fri);
    assert_eq!(at.time, TimeOfDay::new(23, 15).unwrap());
  }
}
