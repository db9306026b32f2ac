//! Where ringer decisions end up.

use std::convert::Infallible;

use polite_core::decision::{MuteDecision, MuteSink, RingerMode};

/// Logs every ringer mode change. Repeated identical decisions are silent.
#[derive(Debug, Default)]
pub struct LogSink {
  last: Option<MuteDecision>,
}

impl LogSink {
  pub fn new() -> Self { Self::default() }

  /// The most recently applied decision, if any.
  pub fn last(&self) -> Option<MuteDecision> { self.last }
}

impl MuteSink for LogSink {
  type Error = Infallible;

  fn apply(&mut self, decision: MuteDecision) -> Result<(), Self::Error> {
    if self.last == Some(decision) {
      return Ok(());
    }
    let mode = decision.ringer_mode();
    match mode {
      RingerMode::Normal => tracing::info!(?mode, "restoring ringer"),
      RingerMode::Vibrate | RingerMode::Silent => {
        tracing::info!(?mode, "muting ringer")
      }
    }
    self.last = Some(decision);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn remembers_last_decision() {
    let mut sink = LogSink::new();
    assert_eq!(sink.last(), None);

    let muted = MuteDecision { mute: true, vibrate: true };
    sink.apply(muted).unwrap();
    sink.apply(muted).unwrap();
    assert_eq!(sink.last(), Some(muted));

    sink.apply(MuteDecision::default()).unwrap();
    assert_eq!(sink.last(), Some(MuteDecision::default()));
  }
}
