//! `polite` binary.
//!
//! Reads `polite.toml` (or the path given with `--config`), opens the SQLite
//! rule store, and either manages rules or runs the mute loop.

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Weekday;
use clap::{Args, Parser, Subcommand, ValueEnum};
use polite_core::{
  days::DaySet,
  event::{EventSource, SystemClock},
  match_by::CalendarEventMatchBy,
  rule::{CalendarRule, Rule, RuleId, ScheduleRule},
  store::{RuleFilter, RuleStore},
  time::TimeOfDay,
};
use polite_daemon::{
  DaemonConfig, Poller,
  events::{JsonFileEventSource, NoEvents},
  sink::LogSink,
};
use polite_store_sqlite::SqliteRuleStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Automatic ringer muting")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "polite.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Evaluate the rules periodically until interrupted.
  Run,
  /// Evaluate the rules once and print the decision.
  Check,
  /// List all stored rules.
  List,
  /// Add a rule that mutes during a weekly time window.
  AddSchedule(AddScheduleArgs),
  /// Add a rule that mutes while a matching calendar event is running.
  AddCalendar(AddCalendarArgs),
  /// Enable a rule.
  Enable { id: i64 },
  /// Disable a rule without deleting it.
  Disable { id: i64 },
  /// Delete a rule.
  Delete { id: i64 },
}

#[derive(Args)]
struct AddScheduleArgs {
  #[arg(long)]
  name:     Option<String>,
  /// Window start, `HH:MM`.
  #[arg(long)]
  begin:    TimeOfDay,
  /// Window end, `HH:MM`. Earlier than `begin` means the window ends on the
  /// following day.
  #[arg(long)]
  end:      TimeOfDay,
  /// Comma-separated days, e.g. `mon,tue,wed`. Defaults to weekdays.
  #[arg(long, value_delimiter = ',')]
  days:     Vec<Weekday>,
  #[arg(long)]
  vibrate:  bool,
  #[arg(long)]
  disabled: bool,
}

impl AddScheduleArgs {
  fn into_rule(self) -> ScheduleRule {
    let mut rule = ScheduleRule::new(self.name.unwrap_or_default());
    rule.begin = self.begin;
    rule.end = self.end;
    if !self.days.is_empty() {
      rule.days = self.days.into_iter().collect::<DaySet>();
    }
    rule.base.vibrate = self.vibrate;
    rule.base.enabled = !self.disabled;
    rule
  }
}

#[derive(Args)]
struct AddCalendarArgs {
  #[arg(long)]
  name:      Option<String>,
  #[arg(long = "match", value_enum, default_value_t = MatchArg::All)]
  match_by:  MatchArg,
  /// Keyword to look for; may be repeated.
  #[arg(long = "keyword")]
  keywords:  Vec<String>,
  /// Calendar id to watch; may be repeated. None means every calendar.
  #[arg(long = "calendar")]
  calendars: Vec<i64>,
  /// Trigger on events that do *not* contain any keyword.
  #[arg(long)]
  inverse:   bool,
  #[arg(long)]
  vibrate:   bool,
  #[arg(long)]
  disabled:  bool,
}

impl AddCalendarArgs {
  fn into_rule(self) -> CalendarRule {
    let mut rule = CalendarRule::new(self.name.unwrap_or_default());
    rule.match_by = self.match_by.into();
    rule.keywords = self.keywords.into_iter().collect();
    rule.calendar_ids = self.calendars;
    rule.inverse_match = self.inverse;
    rule.base.vibrate = self.vibrate;
    rule.base.enabled = !self.disabled;
    rule.normalized()
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum MatchArg {
  All,
  Title,
  Description,
  TitleAndDescription,
}

impl From<MatchArg> for CalendarEventMatchBy {
  fn from(arg: MatchArg) -> Self {
    match arg {
      MatchArg::All => Self::All,
      MatchArg::Title => Self::Title,
      MatchArg::Description => Self::Description,
      MatchArg::TitleAndDescription => Self::TitleAndDescription,
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = DaemonConfig::load(&cli.config)?;

  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteRuleStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Run => evaluate(&cfg, store, false).await,
    Command::Check => evaluate(&cfg, store, true).await,
    Command::List => list(&store).await,
    Command::AddSchedule(args) => {
      let rule = args.into_rule();
      let id = store.create_schedule_rule(&rule).await?;
      println!("created schedule rule {id}: {}", rule.caption());
      Ok(())
    }
    Command::AddCalendar(args) => {
      let rule = args.into_rule();
      let id = store.create_calendar_rule(&rule).await?;
      println!("created calendar rule {id}: {}", rule.caption());
      Ok(())
    }
    Command::Enable { id } => {
      store.set_enabled(RuleId(id), true).await?;
      Ok(())
    }
    Command::Disable { id } => {
      store.set_enabled(RuleId(id), false).await?;
      Ok(())
    }
    Command::Delete { id } => {
      store.delete_rule(RuleId(id)).await?;
      Ok(())
    }
  }
}

/// Run the poll loop, or a single tick when `once` is set.
async fn evaluate(
  cfg: &DaemonConfig,
  store: SqliteRuleStore,
  once: bool,
) -> anyhow::Result<()> {
  match &cfg.events_path {
    Some(path) => {
      drive(cfg, store, JsonFileEventSource::new(path), once).await
    }
    None => {
      tracing::info!("no events_path configured; calendar rules stay idle");
      drive(cfg, store, NoEvents, once).await
    }
  }
}

async fn drive<E: EventSource>(
  cfg: &DaemonConfig,
  store: SqliteRuleStore,
  events: E,
  once: bool,
) -> anyhow::Result<()> {
  let mut poller = Poller::new(store, events, SystemClock, LogSink::new());
  if once {
    let decision = poller.tick().await?;
    println!("{}", serde_json::to_string(&decision.ringer_mode())?);
    return Ok(());
  }
  poller.run(cfg.poll_interval()).await
}

async fn list(store: &SqliteRuleStore) -> anyhow::Result<()> {
  let rules = store.list_rules(RuleFilter::default()).await?;
  if rules.is_empty() {
    println!("no rules");
  }
  for rule in &rules {
    let kind = match rule {
      Rule::Calendar(_) => "calendar",
      Rule::Schedule(_) => "schedule",
    };
    let state = if rule.is_enabled() { "on " } else { "off" };
    println!(
      "{:>4}  {state}  {kind:<8}  {}  {}",
      rule.id(),
      rule.name(),
      rule.caption()
    );
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("polite").chain(args.iter().copied()))
      .unwrap()
      .command
  }

  #[test]
  fn add_calendar_can_start_disabled() {
    let Command::AddCalendar(args) = parse(&[
      "add-calendar",
      "--match",
      "title",
      "--keyword",
      "Standup",
      "--calendar",
      "4",
      "--disabled",
    ]) else {
      panic!("expected add-calendar");
    };
    let rule = args.into_rule();
    assert!(!rule.base.enabled);
    assert_eq!(rule.match_by, CalendarEventMatchBy::Title);
    assert_eq!(rule.calendar_ids, vec![4]);
    assert!(rule.keywords.contains("standup"));
  }

  #[test]
  fn add_calendar_is_enabled_by_default() {
    let Command::AddCalendar(args) = parse(&["add-calendar"]) else {
      panic!("expected add-calendar");
    };
    let rule = args.into_rule();
    assert!(rule.base.enabled);
    assert!(rule.match_by.is_all());
  }

  #[test]
  fn add_schedule_parses_window_and_days() {
    let Command::AddSchedule(args) = parse(&[
      "add-schedule",
      "--begin",
      "22:00",
      "--end",
      "6:30",
      "--days",
      "fri,sat",
      "--disabled",
    ]) else {
      panic!("expected add-schedule");
    };
    let rule = args.into_rule();
    assert!(!rule.base.enabled);
    assert!(rule.crosses_midnight());
    assert_eq!(rule.days, DaySet::EMPTY.with(Weekday::Fri).with(Weekday::Sat));
  }
}
