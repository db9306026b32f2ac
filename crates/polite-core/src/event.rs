//! Calendar events and the collaborators that supply them.
//!
//! The calendar provider and the clock live outside this crate. They are
//! consumed through the [`EventSource`] and [`Clock`] traits so evaluation
//! can be driven by real providers, files, or fixed test data.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
  /// Identifier of the calendar the event belongs to.
  pub calendar_id: i64,
  #[serde(default)]
  pub title:       Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  pub start:       DateTime<Utc>,
  pub end:         DateTime<Utc>,
}

impl CalendarEvent {
  /// `start <= at < end`.
  pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }
}

/// Supplies the calendar events in progress at a given instant.
///
/// The result is a snapshot; callers ask again on every evaluation.
pub trait EventSource {
  type Error: std::error::Error + Send + Sync + 'static;

  fn active_events(
    &self,
    at: DateTime<Utc>,
  ) -> Result<Vec<CalendarEvent>, Self::Error>;
}

/// A fixed list of events, filtered by [`CalendarEvent::is_active_at`].
impl EventSource for [CalendarEvent] {
  type Error = std::convert::Infallible;

  fn active_events(
    &self,
    at: DateTime<Utc>,
  ) -> Result<Vec<CalendarEvent>, Self::Error> {
    Ok(self.iter().filter(|e| e.is_active_at(at)).cloned().collect())
  }
}

impl<T: EventSource + ?Sized> EventSource for &T {
  type Error = T::Error;

  fn active_events(
    &self,
    at: DateTime<Utc>,
  ) -> Result<Vec<CalendarEvent>, Self::Error> {
    (**self).active_events(at)
  }
}

/// Source of the current local time.
pub trait Clock {
  fn now(&self) -> DateTime<Local>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Local> { Local::now() }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn event(start: i64, end: i64) -> CalendarEvent {
    CalendarEvent {
      calendar_id: 1,
      title:       Some("Meeting".into()),
      description: None,
      start:       Utc.timestamp_opt(start, 0).unwrap(),
      end:         Utc.timestamp_opt(end, 0).unwrap(),
    }
  }

  #[test]
  fn active_window_is_half_open() {
    let e = event(100, 200);
    assert!(!e.is_active_at(Utc.timestamp_opt(99, 0).unwrap()));
    assert!(e.is_active_at(Utc.timestamp_opt(100, 0).unwrap()));
    assert!(e.is_active_at(Utc.timestamp_opt(199, 0).unwrap()));
    assert!(!e.is_active_at(Utc.timestamp_opt(200, 0).unwrap()));
  }

  #[test]
  fn slice_source_filters_by_instant() {
    let events = vec![event(0, 50), event(40, 100), event(100, 150)];
    let active = events
      .as_slice()
      .active_events(Utc.timestamp_opt(45, 0).unwrap())
      .unwrap();
    assert_eq!(active.len(), 2);
  }

  #[test]
  fn missing_text_fields_deserialize_as_none() {
    let json = r#"{
      "calendar_id": 3,
      "start": "2024-03-01T09:00:00Z",
      "end": "2024-03-01T10:00:00Z"
    }"#;
    let e: CalendarEvent = serde_json::from_str(json).unwrap();
    assert_eq!(e.calendar_id, 3);
    assert!(e.title.is_none());
    assert!(e.description.is_none());
  }
}
