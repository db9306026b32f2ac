//! Conversions between rule types and the column values stored in SQLite.
//!
//! Booleans are stored as integers. A match mode is stored as three
//! independent flag columns and a day set as seven, Monday first; both are
//! re-validated when read back.

use polite_core::{
  days::DaySet,
  match_by::CalendarEventMatchBy,
  rule::{CalendarRule, RuleBase, RuleId, ScheduleRule},
  time::TimeOfDay,
};

use crate::{Error, Result};

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `rules` row.
pub struct RawRuleBase {
  pub id:      i64,
  pub name:    String,
  pub enabled: bool,
  pub vibrate: bool,
}

impl RawRuleBase {
  /// Read columns `0..4` of a row selected with [`BASE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:      row.get(0)?,
      name:    row.get(1)?,
      enabled: row.get(2)?,
      vibrate: row.get(3)?,
    })
  }

  fn into_base(self) -> RuleBase {
    RuleBase {
      id:      RuleId(self.id),
      name:    self.name,
      enabled: self.enabled,
      vibrate: self.vibrate,
    }
  }
}

pub const BASE_COLUMNS: &str = "r.id, r.name, r.enabled, r.vibrate";

/// Raw values read from a `calendar_rules` row joined with `rules`, plus its
/// calendar and keyword rows.
pub struct RawCalendarRule {
  pub base:              RawRuleBase,
  pub match_all:         bool,
  pub match_title:       bool,
  pub match_description: bool,
  pub inverse_match:     bool,
  pub calendar_ids:      Vec<i64>,
  pub keywords:          Vec<String>,
}

impl RawCalendarRule {
  pub fn id(&self) -> RuleId { RuleId(self.base.id) }

  pub fn into_rule(self) -> Result<CalendarRule> {
    let id = self.id();
    let match_by = CalendarEventMatchBy::from_flags(
      self.match_all,
      self.match_title,
      self.match_description,
    )
    .map_err(|source| Error::Corrupt { id, source })?;

    Ok(CalendarRule {
      base: self.base.into_base(),
      calendar_ids: self.calendar_ids,
      match_by,
      inverse_match: self.inverse_match,
      keywords: self.keywords.into(),
    })
  }
}

/// Raw values read from a `schedule_rules` row joined with `rules`.
pub struct RawScheduleRule {
  pub base:          RawRuleBase,
  pub begin_minutes: u32,
  pub end_minutes:   u32,
  /// `monday` through `sunday`.
  pub days:          [bool; 7],
}

impl RawScheduleRule {
  pub fn id(&self) -> RuleId { RuleId(self.base.id) }

  pub fn into_rule(self) -> Result<ScheduleRule> {
    let id = self.id();
    let corrupt = |source| Error::Corrupt { id, source };
    Ok(ScheduleRule {
      begin: TimeOfDay::from_minutes(self.begin_minutes).map_err(corrupt)?,
      end:   TimeOfDay::from_minutes(self.end_minutes).map_err(corrupt)?,
      days:  DaySet::from_flags(self.days),
      base:  self.base.into_base(),
    })
  }
}

// ─── Column values ───────────────────────────────────────────────────────────

/// Values for the `calendar_rules` flag columns, in column order.
pub fn calendar_flags(rule: &CalendarRule) -> [bool; 4] {
  let (all, title, description) = rule.match_by.flags();
  [all, title, description, rule.inverse_match]
}

/// Values for `begin_minutes`, `end_minutes`, `monday` .. `sunday`.
pub fn schedule_columns(rule: &ScheduleRule) -> (u32, u32, [bool; 7]) {
  (rule.begin.minutes(), rule.end.minutes(), rule.days.to_flags())
}
