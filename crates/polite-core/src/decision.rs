//! Combining per-rule results into a single ringer decision.

use serde::{Deserialize, Serialize};

use crate::rule::{EvaluationContext, Rule};

/// The outcome of evaluating every rule at one instant.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct MuteDecision {
  pub mute:    bool,
  /// Only meaningful when `mute` is set.
  pub vibrate: bool,
}

/// The ringer state a [`MuteDecision`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingerMode {
  Normal,
  Vibrate,
  Silent,
}

impl MuteDecision {
  pub fn ringer_mode(self) -> RingerMode {
    match (self.mute, self.vibrate) {
      (false, _) => RingerMode::Normal,
      (true, true) => RingerMode::Vibrate,
      (true, false) => RingerMode::Silent,
    }
  }
}

/// OR together every enabled, persisted rule that triggers in `ctx`. Vibrate
/// wins if any triggering rule asks for it.
pub fn decide<'r>(
  rules: impl IntoIterator<Item = &'r Rule>,
  ctx: &EvaluationContext<'_>,
) -> MuteDecision {
  rules
    .into_iter()
    .filter(|r| r.is_enabled() && !r.id().is_new())
    .filter(|r| r.is_triggered(ctx))
    .fold(MuteDecision::default(), |acc, r| MuteDecision {
      mute:    true,
      vibrate: acc.vibrate || r.vibrate(),
    })
}

/// Consumes ringer decisions, e.g. by switching the device's ringer mode.
pub trait MuteSink {
  type Error: std::error::Error + Send + Sync + 'static;

  fn apply(&mut self, decision: MuteDecision) -> Result<(), Self::Error>;
}
