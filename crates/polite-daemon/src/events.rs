//! Calendar events read from a JSON file.
//!
//! The file holds an array of [`CalendarEvent`] objects and is re-read on
//! every poll, so an external exporter can rewrite it at any time.

use std::{io, path::PathBuf};

use chrono::{DateTime, Utc};
use polite_core::event::{CalendarEvent, EventSource};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventFileError {
  #[error("failed to read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path:?}: {source}")]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// An [`EventSource`] backed by a JSON file. A missing file means no events.
#[derive(Debug, Clone)]
pub struct JsonFileEventSource {
  path: PathBuf,
}

impl JsonFileEventSource {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl EventSource for JsonFileEventSource {
  type Error = EventFileError;

  fn active_events(
    &self,
    at: DateTime<Utc>,
  ) -> Result<Vec<CalendarEvent>, Self::Error> {
    let raw = match std::fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        tracing::debug!(path = ?self.path, "event file missing; assuming no events");
        return Ok(Vec::new());
      }
      Err(source) => {
        return Err(EventFileError::Io { path: self.path.clone(), source });
      }
    };

    let events: Vec<CalendarEvent> = serde_json::from_str(&raw)
      .map_err(|source| EventFileError::Json { path: self.path.clone(), source })?;
    events.as_slice().active_events(at).map_err(|never| match never {})
  }
}

/// No calendar access configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl EventSource for NoEvents {
  type Error = std::convert::Infallible;

  fn active_events(
    &self,
    _at: DateTime<Utc>,
  ) -> Result<Vec<CalendarEvent>, Self::Error> {
    Ok(Vec::new())
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("polite-events-{}-{name}.json", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_no_events() {
    let source = JsonFileEventSource::new("/nonexistent/polite/events.json");
    assert!(source.active_events(Utc::now()).unwrap().is_empty());
  }

  #[test]
  fn only_active_events_are_returned() {
    let path = temp_file(
      "active",
      r#"[
        {"calendar_id": 1, "title": "Standup",
         "start": "2024-03-04T09:00:00Z", "end": "2024-03-04T09:15:00Z"},
        {"calendar_id": 2, "title": "Lunch", "description": "canteen",
         "start": "2024-03-04T12:00:00Z", "end": "2024-03-04T13:00:00Z"}
      ]"#,
    );
    let source = JsonFileEventSource::new(&path);

    let at = Utc.with_ymd_and_hms(2024, 3, 4, 12, 30, 0).unwrap();
    let events = source.active_events(at).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title.as_deref(), Some("Lunch"));
  }

  #[test]
  fn malformed_file_is_an_error() {
    let path = temp_file("malformed", "{ not json");
    let err = JsonFileEventSource::new(&path)
      .active_events(Utc::now())
      .unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, EventFileError::Json { .. }));
  }
}
