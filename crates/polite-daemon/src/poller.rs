//! The evaluation loop.

use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;
use polite_core::{
  decision::{MuteDecision, MuteSink, decide},
  event::{Clock, EventSource},
  rule::EvaluationContext,
  store::{RuleFilter, RuleStore},
  time::WeeklyInstant,
};

/// Periodically re-evaluates every enabled rule and forwards the result.
pub struct Poller<S, E, C, K> {
  store:  S,
  events: E,
  clock:  C,
  sink:   K,
}

impl<S, E, C, K> Poller<S, E, C, K>
where
  S: RuleStore,
  E: EventSource,
  C: Clock,
  K: MuteSink,
{
  pub fn new(store: S, events: E, clock: C, sink: K) -> Self {
    Self { store, events, clock, sink }
  }

  pub fn sink(&self) -> &K { &self.sink }

  /// Evaluate once and apply the decision.
  pub async fn tick(&mut self) -> anyhow::Result<MuteDecision> {
    let now = self.clock.now();
    let rules = self
      .store
      .list_rules(RuleFilter::enabled())
      .await
      .context("failed to load rules")?;
    let events = self
      .events
      .active_events(now.with_timezone(&Utc))
      .context("failed to read calendar events")?;

    let ctx = EvaluationContext {
      now:    WeeklyInstant::from_datetime(&now),
      events: &events,
    };
    let decision = decide(&rules, &ctx);
    tracing::debug!(
      rules = rules.len(),
      events = events.len(),
      mute = decision.mute,
      vibrate = decision.vibrate,
      "evaluated rules"
    );

    self
      .sink
      .apply(decision)
      .context("failed to apply ringer decision")?;
    Ok(decision)
  }

  /// Tick every `interval` until Ctrl-C. A failed tick is logged and the
  /// loop carries on.
  pub async fn run(mut self, interval: Duration) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(?interval, "polling rules");

    loop {
      tokio::select! {
        _ = ticker.tick() => {
          if let Err(e) = self.tick().await {
            tracing::warn!("tick failed: {e:#}");
          }
        }
        res = tokio::signal::ctrl_c() => {
          res.context("failed to listen for shutdown signal")?;
          tracing::info!("shutting down");
          return Ok(());
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Local, TimeZone};
  use polite_core::{
    event::CalendarEvent,
    match_by::CalendarEventMatchBy,
    rule::{CalendarRule, ScheduleRule},
  };
  use polite_store_sqlite::SqliteRuleStore;

  use super::*;
  use crate::sink::LogSink;

  struct FixedClock(DateTime<Local>);

  impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> { self.0 }
  }

  /// Monday 4 March 2024, 12:30 local time.
  fn monday_lunchtime() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 4, 12, 30, 0).unwrap()
  }

  async fn store() -> SqliteRuleStore {
    SqliteRuleStore::open_in_memory().await.unwrap()
  }

  #[tokio::test]
  async fn empty_store_leaves_ringer_alone() {
    let events: &[CalendarEvent] = &[];
    let mut poller =
      Poller::new(store().await, events, FixedClock(monday_lunchtime()), LogSink::new());

    let decision = poller.tick().await.unwrap();
    assert!(!decision.mute);
    assert_eq!(poller.sink().last(), Some(decision));
  }

  #[tokio::test]
  async fn schedule_rule_mutes_inside_window() {
    let store = store().await;
    let mut lunch = ScheduleRule::new("Lunch");
    lunch.base.vibrate = true;
    store.create_schedule_rule(&lunch).await.unwrap();

    let events: &[CalendarEvent] = &[];
    let mut poller =
      Poller::new(store, events, FixedClock(monday_lunchtime()), LogSink::new());

    let decision = poller.tick().await.unwrap();
    assert_eq!(decision, MuteDecision { mute: true, vibrate: true });
  }

  #[tokio::test]
  async fn disabled_rules_are_not_loaded() {
    let store = store().await;
    let id = store
      .create_schedule_rule(&ScheduleRule::new("Lunch"))
      .await
      .unwrap();
    store.set_enabled(id, false).await.unwrap();

    let events: &[CalendarEvent] = &[];
    let mut poller =
      Poller::new(store, events, FixedClock(monday_lunchtime()), LogSink::new());
    assert!(!poller.tick().await.unwrap().mute);
  }

  #[tokio::test]
  async fn calendar_rule_mutes_during_matching_event() {
    let now = monday_lunchtime();
    let store = store().await;
    let mut standup = CalendarRule::new("Standup");
    standup.match_by = CalendarEventMatchBy::Title;
    standup.keywords = ["standup"].into_iter().collect();
    store.create_calendar_rule(&standup).await.unwrap();

    let utc = now.with_timezone(&Utc);
    let events = vec![CalendarEvent {
      calendar_id: 7,
      title:       Some("Daily Standup".into()),
      description: None,
      start:       utc - chrono::Duration::minutes(5),
      end:         utc + chrono::Duration::minutes(10),
    }];

    let mut poller =
      Poller::new(store, events.as_slice(), FixedClock(now), LogSink::new());
    let decision = poller.tick().await.unwrap();
    assert_eq!(decision, MuteDecision { mute: true, vibrate: false });
  }
}
