//! The `RuleStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `polite-store-sqlite`).
//! The daemon depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::rule::{CalendarRule, Rule, RuleId, ScheduleRule};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for the `list_*` methods of [`RuleStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleFilter {
  /// Restrict to enabled (`Some(true)`) or disabled (`Some(false)`) rules.
  pub enabled: Option<bool>,
}

impl RuleFilter {
  pub fn enabled() -> Self { Self { enabled: Some(true) } }

  pub fn admits(&self, rule: &Rule) -> bool {
    self.enabled.is_none_or(|e| e == rule.is_enabled())
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a rule store backend.
///
/// Every create and save applies [`Rule::normalized`] before writing, so
/// loading a rule and saving it back unchanged is a no-op.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait RuleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All calendar rules admitted by `filter`. Rules whose stored data cannot
  /// be decoded are skipped.
  fn list_calendar_rules(
    &self,
    filter: RuleFilter,
  ) -> impl Future<Output = Result<Vec<CalendarRule>, Self::Error>> + Send + '_;

  /// All schedule rules admitted by `filter`.
  fn list_schedule_rules(
    &self,
    filter: RuleFilter,
  ) -> impl Future<Output = Result<Vec<ScheduleRule>, Self::Error>> + Send + '_;

  /// Calendar and schedule rules together.
  fn list_rules(
    &self,
    filter: RuleFilter,
  ) -> impl Future<Output = Result<Vec<Rule>, Self::Error>> + Send + '_;

  /// Returns `None` if no calendar rule has this id.
  fn get_calendar_rule(
    &self,
    id: RuleId,
  ) -> impl Future<Output = Result<Option<CalendarRule>, Self::Error>> + Send + '_;

  /// Returns `None` if no schedule rule has this id.
  fn get_schedule_rule(
    &self,
    id: RuleId,
  ) -> impl Future<Output = Result<Option<ScheduleRule>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new calendar rule with its calendar ids and keywords and
  /// return the assigned id. The id on `rule` is ignored.
  fn create_calendar_rule<'a>(
    &'a self,
    rule: &'a CalendarRule,
  ) -> impl Future<Output = Result<RuleId, Self::Error>> + Send + 'a;

  /// Overwrite an existing calendar rule, replacing its calendar ids and
  /// keywords wholesale. Fails if `rule.base.id` is not stored.
  fn save_calendar_rule<'a>(
    &'a self,
    rule: &'a CalendarRule,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Persist a new schedule rule and return the assigned id. The id on
  /// `rule` is ignored.
  fn create_schedule_rule<'a>(
    &'a self,
    rule: &'a ScheduleRule,
  ) -> impl Future<Output = Result<RuleId, Self::Error>> + Send + 'a;

  /// Overwrite an existing schedule rule. Fails if `rule.base.id` is not
  /// stored.
  fn save_schedule_rule<'a>(
    &'a self,
    rule: &'a ScheduleRule,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Toggle a rule without rewriting the rest of it.
  fn set_enabled(
    &self,
    id: RuleId,
    enabled: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a rule of either kind together with its related rows.
  fn delete_rule(
    &self,
    id: RuleId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Create `rule` if it has never been stored, otherwise save it. A newly
/// assigned id is written back into `rule`.
pub async fn persist<S: RuleStore>(
  store: &S,
  rule: &mut Rule,
) -> Result<RuleId, S::Error> {
  if rule.id().is_new() {
    let id = match rule {
      Rule::Calendar(r) => store.create_calendar_rule(r).await?,
      Rule::Schedule(r) => store.create_schedule_rule(r).await?,
    };
    rule.base_mut().id = id;
    Ok(id)
  } else {
    match rule {
      Rule::Calendar(r) => store.save_calendar_rule(r).await?,
      Rule::Schedule(r) => store.save_schedule_rule(r).await?,
    }
    Ok(rule.id())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn filter_admits_by_enabled_flag() {
    let mut rule = Rule::from(ScheduleRule::new("Lunch"));
    assert!(RuleFilter::default().admits(&rule));
    assert!(RuleFilter::enabled().admits(&rule));
    rule.base_mut().enabled = false;
    assert!(!RuleFilter::enabled().admits(&rule));
    assert!(RuleFilter { enabled: Some(false) }.admits(&rule));
  }
}
