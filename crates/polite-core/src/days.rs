//! [`DaySet`] — the weekdays a schedule rule is active on.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Monday-first ordering used for iteration, storage columns and summaries.
pub const WEEK: [Weekday; 7] = [
  Weekday::Mon,
  Weekday::Tue,
  Weekday::Wed,
  Weekday::Thu,
  Weekday::Fri,
  Weekday::Sat,
  Weekday::Sun,
];

/// A set of weekdays. Bit `n` is set when `WEEK[n]` is a member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct DaySet(u8);

impl DaySet {
  pub const EMPTY: Self = Self(0);
  pub const EVERY_DAY: Self = Self(0b111_1111);
  pub const WEEKDAYS: Self = Self(0b001_1111);
  pub const WEEKEND: Self = Self(0b110_0000);

  fn bit(day: Weekday) -> u8 { 1 << day.num_days_from_monday() }

  pub fn contains(self, day: Weekday) -> bool { self.0 & Self::bit(day) != 0 }

  pub fn insert(&mut self, day: Weekday) { self.0 |= Self::bit(day); }

  pub fn remove(&mut self, day: Weekday) { self.0 &= !Self::bit(day); }

  pub fn with(mut self, day: Weekday) -> Self {
    self.insert(day);
    self
  }

  pub fn len(self) -> usize { self.0.count_ones() as usize }

  pub fn is_empty(self) -> bool { self.0 == 0 }

  /// Members in Monday-first order.
  pub fn iter(self) -> impl Iterator<Item = Weekday> {
    WEEK.into_iter().filter(move |d| self.contains(*d))
  }

  /// One flag per day, Monday first — the layout of the storage columns.
  pub fn to_flags(self) -> [bool; 7] { WEEK.map(|d| self.contains(d)) }

  pub fn from_flags(flags: [bool; 7]) -> Self {
    WEEK
      .into_iter()
      .zip(flags)
      .filter(|(_, on)| *on)
      .map(|(d, _)| d)
      .collect()
  }

  pub fn mask(self) -> u8 { self.0 }

  /// Returns `None` if any bit above Sunday is set.
  pub fn from_mask(mask: u8) -> Option<Self> {
    (mask & !Self::EVERY_DAY.0 == 0).then_some(Self(mask))
  }

  /// Human-readable summary, e.g. "Weekdays" or "Mon–Wed, Sat".
  pub fn summary(self) -> String {
    match self {
      Self::EMPTY => return "No days".to_owned(),
      Self::EVERY_DAY => return "Every day".to_owned(),
      Self::WEEKDAYS => return "Weekdays".to_owned(),
      Self::WEEKEND => return "Weekends".to_owned(),
      _ => {}
    }

    let mut parts: Vec<String> = vec![];
    let mut i = 0;
    while i < WEEK.len() {
      if !self.contains(WEEK[i]) {
        i += 1;
        continue;
      }
      let start = i;
      while i + 1 < WEEK.len() && self.contains(WEEK[i + 1]) {
        i += 1;
      }
      match i - start {
        0 => parts.push(short_name(WEEK[start]).to_owned()),
        1 => {
          parts.push(short_name(WEEK[start]).to_owned());
          parts.push(short_name(WEEK[i]).to_owned());
        }
        _ => parts.push(format!(
          "{}–{}",
          short_name(WEEK[start]),
          short_name(WEEK[i])
        )),
      }
      i += 1;
    }
    parts.join(", ")
  }
}

fn short_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "Mon",
    Weekday::Tue => "Tue",
    Weekday::Wed => "Wed",
    Weekday::Thu => "Thu",
    Weekday::Fri => "Fri",
    Weekday::Sat => "Sat",
    Weekday::Sun => "Sun",
  }
}

impl FromIterator<Weekday> for DaySet {
  fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
    let mut set = Self::EMPTY;
    for day in iter {
      set.insert(day);
    }
    set
  }
}

impl From<Vec<Weekday>> for DaySet {
  fn from(days: Vec<Weekday>) -> Self { days.into_iter().collect() }
}

impl From<DaySet> for Vec<Weekday> {
  fn from(set: DaySet) -> Self { set.iter().collect() }
}

impl fmt::Debug for DaySet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_are_monday_first() {
    let set = DaySet::EMPTY.with(Weekday::Mon).with(Weekday::Sun);
    assert_eq!(set.to_flags(), [true, false, false, false, false, false, true]);
    assert_eq!(DaySet::from_flags(set.to_flags()), set);
  }

  #[test]
  fn named_sets() {
    assert_eq!(DaySet::WEEKDAYS.len(), 5);
    assert!(DaySet::WEEKEND.contains(Weekday::Sat));
    assert!(!DaySet::WEEKEND.contains(Weekday::Fri));
    assert_eq!(DaySet::EVERY_DAY.iter().count(), 7);
  }

  #[test]
  fn insert_is_idempotent() {
    let mut set = DaySet::EMPTY;
    set.insert(Weekday::Wed);
    set.insert(Weekday::Wed);
    assert_eq!(set.len(), 1);
    set.remove(Weekday::Wed);
    assert!(set.is_empty());
  }

  #[test]
  fn mask_rejects_high_bit() {
    assert_eq!(DaySet::from_mask(0b000_0001), Some(DaySet::EMPTY.with(Weekday::Mon)));
    assert_eq!(DaySet::from_mask(0b1000_0000), None);
  }

  #[test]
  fn summary_special_cases() {
    assert_eq!(DaySet::EVERY_DAY.summary(), "Every day");
    assert_eq!(DaySet::WEEKDAYS.summary(), "Weekdays");
    assert_eq!(DaySet::WEEKEND.summary(), "Weekends");
    assert_eq!(DaySet::EMPTY.summary(), "No days");
  }

  #[test]
  fn summary_collapses_runs() {
    let set: DaySet = [
      Weekday::Mon,
      Weekday::Tue,
      Weekday::Wed,
      Weekday::Fri,
      Weekday::Sat,
    ]
    .into_iter()
    .collect();
    assert_eq!(set.summary(), "Mon–Wed, Fri, Sat");

    let single = DaySet::EMPTY.with(Weekday::Thu);
    assert_eq!(single.summary(), "Thu");
  }

  #[test]
  fn serde_as_weekday_list() {
    let set = DaySet::EMPTY.with(Weekday::Tue).with(Weekday::Mon);
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(json, r#"["Mon","Tue"]"#);
    let back: DaySet = serde_json::from_str(&json).unwrap();
    assert_eq!(back, set);
  }
}
