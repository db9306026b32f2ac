//! Rule types — the user-defined conditions under which the device is muted.
//!
//! A [`Rule`] is either a [`CalendarRule`] or a [`ScheduleRule`]. Both share a
//! [`RuleBase`] (identity, name, and the enabled/vibrate flags). Evaluation
//! never mutates a rule; [`Rule::normalized`] is the single place stored data
//! is brought back in line with the rule invariants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  days::DaySet,
  event::CalendarEvent,
  match_by::{CalendarEventMatchBy, Keywords},
  schedule,
  time::{TimeOfDay, WeeklyInstant},
};

/// Name given to rules created without one.
pub const DEFAULT_RULE_NAME: &str = "New rule";

// ─── Identity ────────────────────────────────────────────────────────────────

/// Store-assigned rule identifier. [`RuleId::NEW`] marks a rule that has not
/// been persisted yet.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RuleId(pub i64);

impl RuleId {
  pub const NEW: Self = Self(-1);

  pub fn is_new(self) -> bool { self == Self::NEW }
}

impl Default for RuleId {
  fn default() -> Self { Self::NEW }
}

impl fmt::Display for RuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_new() { f.write_str("new") } else { write!(f, "{}", self.0) }
  }
}

// ─── Shared fields ───────────────────────────────────────────────────────────

/// Fields common to every rule kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBase {
  pub id:      RuleId,
  pub name:    String,
  /// Disabled rules are never evaluated.
  pub enabled: bool,
  /// Mute to vibrate instead of silent.
  pub vibrate: bool,
}

impl RuleBase {
  /// A transient, enabled, silent rule. A blank name falls back to
  /// [`DEFAULT_RULE_NAME`].
  pub fn new(name: impl Into<String>) -> Self {
    let mut base = Self {
      id:      RuleId::NEW,
      name:    name.into(),
      enabled: true,
      vibrate: false,
    };
    base.normalize();
    base
  }

  fn normalize(&mut self) {
    if self.name.trim().is_empty() {
      self.name = DEFAULT_RULE_NAME.to_owned();
    }
  }
}

impl Default for RuleBase {
  fn default() -> Self { Self::new(DEFAULT_RULE_NAME) }
}

// ─── Evaluation input ────────────────────────────────────────────────────────

/// Everything a rule needs to decide whether it is triggering right now.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
  pub now:    WeeklyInstant,
  /// Calendar events in progress at `now`.
  pub events: &'a [CalendarEvent],
}

// ─── Calendar rule ───────────────────────────────────────────────────────────

/// Mutes while a matching calendar event is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRule {
  #[serde(flatten)]
  pub base:          RuleBase,
  /// Calendars to consider; empty means all of them.
  pub calendar_ids:  Vec<i64>,
  pub match_by:      CalendarEventMatchBy,
  pub inverse_match: bool,
  pub keywords:      Keywords,
}

impl CalendarRule {
  /// A rule that matches every event on every calendar.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      base:          RuleBase::new(name),
      calendar_ids:  Vec::new(),
      match_by:      CalendarEventMatchBy::All,
      inverse_match: false,
      keywords:      Keywords::new(),
    }
  }

  fn watches(&self, calendar_id: i64) -> bool {
    self.calendar_ids.is_empty() || self.calendar_ids.contains(&calendar_id)
  }

  /// Whether `event` is on a watched calendar and passes the keyword test.
  pub fn matches_event(&self, event: &CalendarEvent) -> bool {
    self.watches(event.calendar_id)
      && self.match_by.matches(
        event.title.as_deref(),
        event.description.as_deref(),
        &self.keywords,
        self.inverse_match,
      )
  }

  pub fn is_triggered(&self, events: &[CalendarEvent]) -> bool {
    self.base.enabled && events.iter().any(|e| self.matches_event(e))
  }

  pub fn caption(&self) -> String { self.keywords.caption() }

  /// Matching by [`CalendarEventMatchBy::All`] keeps no keywords.
  pub fn normalized(mut self) -> Self {
    self.base.normalize();
    if self.match_by.is_all() {
      self.keywords.clear();
    }
    self
  }
}

// ─── Schedule rule ───────────────────────────────────────────────────────────

/// Mutes during a recurring weekly window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
  #[serde(flatten)]
  pub base:  RuleBase,
  pub begin: TimeOfDay,
  /// Exclusive. Earlier than `begin` for windows that cross midnight.
  pub end:   TimeOfDay,
  pub days:  DaySet,
}

impl ScheduleRule {
  /// Lunch hour on weekdays.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      base:  RuleBase::new(name),
      begin: TimeOfDay::wrapping(12 * 60),
      end:   TimeOfDay::wrapping(13 * 60),
      days:  DaySet::WEEKDAYS,
    }
  }

  pub fn crosses_midnight(&self) -> bool { self.end < self.begin }

  pub fn is_triggered(&self, now: WeeklyInstant) -> bool {
    self.base.enabled
      && schedule::window_contains(self.days, self.begin, self.end, now)
  }

  pub fn caption(&self) -> String {
    schedule::summary(self.days, self.begin, self.end)
  }

  pub fn normalized(mut self) -> Self {
    self.base.normalize();
    self
  }
}

// ─── Rule ────────────────────────────────────────────────────────────────────

/// Any rule, dispatched by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
  Calendar(CalendarRule),
  Schedule(ScheduleRule),
}

impl Rule {
  pub fn base(&self) -> &RuleBase {
    match self {
      Self::Calendar(r) => &r.base,
      Self::Schedule(r) => &r.base,
    }
  }

  pub fn base_mut(&mut self) -> &mut RuleBase {
    match self {
      Self::Calendar(r) => &mut r.base,
      Self::Schedule(r) => &mut r.base,
    }
  }

  pub fn id(&self) -> RuleId { self.base().id }

  pub fn name(&self) -> &str { &self.base().name }

  pub fn is_enabled(&self) -> bool { self.base().enabled }

  pub fn vibrate(&self) -> bool { self.base().vibrate }

  /// Whether this rule wants the device muted in `ctx`. Disabled rules never
  /// trigger.
  pub fn is_triggered(&self, ctx: &EvaluationContext<'_>) -> bool {
    match self {
      Self::Calendar(r) => r.is_triggered(ctx.events),
      Self::Schedule(r) => r.is_triggered(ctx.now),
    }
  }

  /// One-line description for rule lists.
  pub fn caption(&self) -> String {
    match self {
      Self::Calendar(r) => r.caption(),
      Self::Schedule(r) => r.caption(),
    }
  }

  /// The rule as it must be persisted.
  pub fn normalized(self) -> Self {
    match self {
      Self::Calendar(r) => Self::Calendar(r.normalized()),
      Self::Schedule(r) => Self::Schedule(r.normalized()),
    }
  }
}

impl From<CalendarRule> for Rule {
  fn from(r: CalendarRule) -> Self { Self::Calendar(r) }
}

impl From<ScheduleRule> for Rule {
  fn from(r: ScheduleRule) -> Self { Self::Schedule(r) }
}
