//! Weekly window evaluation for schedule rules.
//!
//! A window runs from `begin` (inclusive) to `end` (exclusive) on each day in
//! its day set. When `end < begin` the window wraps past midnight: it starts
//! on a listed day and finishes on the following day. `begin == end` is an
//! empty window.

use crate::{days::DaySet, time::{TimeOfDay, WeeklyInstant}};

/// Whether `at` falls inside the window `[begin, end)` repeated on `days`.
pub fn window_contains(
  days: DaySet,
  begin: TimeOfDay,
  end: TimeOfDay,
  at: WeeklyInstant,
) -> bool {
  if begin < end {
    days.contains(at.weekday) && begin <= at.time && at.time < end
  } else if begin > end {
    // Evening part belongs to today, early-morning part to yesterday's window.
    (at.time >= begin && days.contains(at.weekday))
      || (at.time < end && days.contains(at.weekday.pred()))
  } else {
    false
  }
}

/// Caption for a window, e.g. `Weekdays, 22:00–06:00 (next day)`.
pub fn summary(days: DaySet, begin: TimeOfDay, end: TimeOfDay) -> String {
  let next_day = if end < begin { " (next day)" } else { "" };
  format!("{}, {begin}–{end}{next_day}", days.summary())
}
