//! [`SqliteRuleStore`] — the SQLite implementation of [`RuleStore`].

use std::path::Path;

use polite_core::{
  rule::{CalendarRule, Rule, RuleBase, RuleId, ScheduleRule},
  store::{RuleFilter, RuleStore},
};
use rusqlite::{OptionalExtension as _, params};

use crate::{
  Error, Result,
  encode::{
    BASE_COLUMNS, RawCalendarRule, RawRuleBase, RawScheduleRule, calendar_flags,
    schedule_columns,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rule store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteRuleStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteRuleStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection. Used by tests to plant rows the
  /// public API refuses to write.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_calendar_rules(
    &self,
    id: Option<RuleId>,
    filter: RuleFilter,
  ) -> Result<Vec<RawCalendarRule>> {
    let id = id.map(|id| id.0);
    Ok(
      self
        .conn
        .call(move |conn| {
          let sql = format!(
            "SELECT {BASE_COLUMNS},
               c.match_all, c.match_title, c.match_description, c.inverse_match
             FROM rules r
             INNER JOIN calendar_rules c ON c.id = r.id
             WHERE (?1 IS NULL OR r.id = ?1)
               AND (?2 IS NULL OR r.enabled = ?2)
             ORDER BY r.name COLLATE NOCASE, r.id"
          );
          let mut stmt = conn.prepare(&sql)?;
          let mut rules = stmt
            .query_map(params![id, filter.enabled], |row| {
              Ok(RawCalendarRule {
                base:              RawRuleBase::from_row(row)?,
                match_all:         row.get(4)?,
                match_title:       row.get(5)?,
                match_description: row.get(6)?,
                inverse_match:     row.get(7)?,
                calendar_ids:      Vec::new(),
                keywords:          Vec::new(),
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut calendars = conn.prepare(
            "SELECT calendar_id FROM calendar_rule_calendars
             WHERE rule_id = ?1 ORDER BY rowid",
          )?;
          let mut keywords = conn.prepare(
            "SELECT word FROM calendar_rule_keywords WHERE rule_id = ?1",
          )?;
          for rule in &mut rules {
            rule.calendar_ids = calendars
              .query_map(params![rule.base.id], |row| row.get::<_, i64>(0))?
              .collect::<rusqlite::Result<_>>()?;
            rule.keywords = keywords
              .query_map(params![rule.base.id], |row| row.get::<_, String>(0))?
              .collect::<rusqlite::Result<_>>()?;
          }

          Ok(rules)
        })
        .await?,
    )
  }

  async fn fetch_schedule_rules(
    &self,
    id: Option<RuleId>,
    filter: RuleFilter,
  ) -> Result<Vec<RawScheduleRule>> {
    let id = id.map(|id| id.0);
    Ok(
      self
        .conn
        .call(move |conn| {
          let sql = format!(
            "SELECT {BASE_COLUMNS},
               s.begin_minutes, s.end_minutes,
               s.monday, s.tuesday, s.wednesday, s.thursday,
               s.friday, s.saturday, s.sunday
             FROM rules r
             INNER JOIN schedule_rules s ON s.id = r.id
             WHERE (?1 IS NULL OR r.id = ?1)
               AND (?2 IS NULL OR r.enabled = ?2)
             ORDER BY r.name COLLATE NOCASE, r.id"
          );
          let mut stmt = conn.prepare(&sql)?;
          let rules = stmt
            .query_map(params![id, filter.enabled], |row| {
              Ok(RawScheduleRule {
                base:          RawRuleBase::from_row(row)?,
                begin_minutes: row.get(4)?,
                end_minutes:   row.get(5)?,
                days:          [
                  row.get(6)?,
                  row.get(7)?,
                  row.get(8)?,
                  row.get(9)?,
                  row.get(10)?,
                  row.get(11)?,
                  row.get(12)?,
                ],
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rules)
        })
        .await?,
    )
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────

fn insert_base(conn: &rusqlite::Connection, base: &RuleBase) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO rules (name, enabled, vibrate) VALUES (?1, ?2, ?3)",
    params![base.name, base.enabled, base.vibrate],
  )?;
  Ok(conn.last_insert_rowid())
}

fn update_base(conn: &rusqlite::Connection, base: &RuleBase) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE rules SET name = ?1, enabled = ?2, vibrate = ?3 WHERE id = ?4",
    params![base.name, base.enabled, base.vibrate, base.id.0],
  )
}

/// Replace the calendar and keyword rows of calendar rule `id`.
fn replace_calendar_children(
  conn: &rusqlite::Connection,
  id: i64,
  rule: &CalendarRule,
) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM calendar_rule_calendars WHERE rule_id = ?1", params![id])?;
  conn.execute("DELETE FROM calendar_rule_keywords WHERE rule_id = ?1", params![id])?;

  let mut calendars = conn.prepare(
    "INSERT INTO calendar_rule_calendars (rule_id, calendar_id) VALUES (?1, ?2)",
  )?;
  for calendar_id in &rule.calendar_ids {
    calendars.execute(params![id, calendar_id])?;
  }

  let mut keywords = conn
    .prepare("INSERT INTO calendar_rule_keywords (rule_id, word) VALUES (?1, ?2)")?;
  for word in rule.keywords.iter() {
    keywords.execute(params![id, word])?;
  }
  Ok(())
}

/// `Ok(())` when a statement touched a row, otherwise `RuleNotFound`.
fn found(id: RuleId, touched: bool) -> Result<()> {
  if touched { Ok(()) } else { Err(Error::RuleNotFound(id)) }
}

// ─── RuleStore impl ──────────────────────────────────────────────────────────

impl RuleStore for SqliteRuleStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_calendar_rules(&self, filter: RuleFilter) -> Result<Vec<CalendarRule>> {
    let raws = self.fetch_calendar_rules(None, filter).await?;
    let mut rules = Vec::with_capacity(raws.len());
    for raw in raws {
      match raw.into_rule() {
        Ok(rule) => rules.push(rule),
        // One unreadable rule must not hide the others.
        Err(e) => tracing::warn!("skipping calendar rule: {e}"),
      }
    }
    Ok(rules)
  }

  async fn list_schedule_rules(&self, filter: RuleFilter) -> Result<Vec<ScheduleRule>> {
    let raws = self.fetch_schedule_rules(None, filter).await?;
    let mut rules = Vec::with_capacity(raws.len());
    for raw in raws {
      match raw.into_rule() {
        Ok(rule) => rules.push(rule),
        Err(e) => tracing::warn!("skipping schedule rule: {e}"),
      }
    }
    Ok(rules)
  }

  async fn list_rules(&self, filter: RuleFilter) -> Result<Vec<Rule>> {
    let mut rules: Vec<Rule> = self
      .list_calendar_rules(filter)
      .await?
      .into_iter()
      .map(Rule::from)
      .collect();
    rules.extend(
      self
        .list_schedule_rules(filter)
        .await?
        .into_iter()
        .map(Rule::from),
    );
    rules.sort_by_cached_key(|r| (r.name().to_lowercase(), r.id()));
    Ok(rules)
  }

  async fn get_calendar_rule(&self, id: RuleId) -> Result<Option<CalendarRule>> {
    self
      .fetch_calendar_rules(Some(id), RuleFilter::default())
      .await?
      .pop()
      .map(RawCalendarRule::into_rule)
      .transpose()
  }

  async fn get_schedule_rule(&self, id: RuleId) -> Result<Option<ScheduleRule>> {
    self
      .fetch_schedule_rules(Some(id), RuleFilter::default())
      .await?
      .pop()
      .map(RawScheduleRule::into_rule)
      .transpose()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create_calendar_rule(&self, rule: &CalendarRule) -> Result<RuleId> {
    let rule = rule.clone().normalized();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id = insert_base(&tx, &rule.base)?;
        let [all, title, description, inverse] = calendar_flags(&rule);
        tx.execute(
          "INSERT INTO calendar_rules (
             id, match_all, match_title, match_description, inverse_match
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          params![id, all, title, description, inverse],
        )?;
        replace_calendar_children(&tx, id, &rule)?;
        tx.commit()?;
        Ok(id)
      })
      .await?;

    tracing::debug!(id, "created calendar rule");
    Ok(RuleId(id))
  }

  async fn save_calendar_rule(&self, rule: &CalendarRule) -> Result<()> {
    let id = rule.base.id;
    if id.is_new() {
      return Err(Error::RuleNotFound(id));
    }
    let rule = rule.clone().normalized();

    let touched = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let [all, title, description, inverse] = calendar_flags(&rule);
        let n = tx.execute(
          "UPDATE calendar_rules
           SET match_all = ?1, match_title = ?2, match_description = ?3,
               inverse_match = ?4
           WHERE id = ?5",
          params![all, title, description, inverse, id.0],
        )?;
        // Dropping the transaction rolls it back.
        if n == 0 {
          return Ok(false);
        }
        update_base(&tx, &rule.base)?;
        replace_calendar_children(&tx, id.0, &rule)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    found(id, touched)?;
    tracing::debug!(id = id.0, "saved calendar rule");
    Ok(())
  }

  async fn create_schedule_rule(&self, rule: &ScheduleRule) -> Result<RuleId> {
    let rule = rule.clone().normalized();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id = insert_base(&tx, &rule.base)?;
        let (begin, end, [mon, tue, wed, thu, fri, sat, sun]) = schedule_columns(&rule);
        tx.execute(
          "INSERT INTO schedule_rules (
             id, begin_minutes, end_minutes,
             monday, tuesday, wednesday, thursday, friday, saturday, sunday
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          params![id, begin, end, mon, tue, wed, thu, fri, sat, sun],
        )?;
        tx.commit()?;
        Ok(id)
      })
      .await?;

    tracing::debug!(id, "created schedule rule");
    Ok(RuleId(id))
  }

  async fn save_schedule_rule(&self, rule: &ScheduleRule) -> Result<()> {
    let id = rule.base.id;
    if id.is_new() {
      return Err(Error::RuleNotFound(id));
    }
    let rule = rule.clone().normalized();

    let touched = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let (begin, end, [mon, tue, wed, thu, fri, sat, sun]) = schedule_columns(&rule);
        let n = tx.execute(
          "UPDATE schedule_rules
           SET begin_minutes = ?1, end_minutes = ?2,
               monday = ?3, tuesday = ?4, wednesday = ?5, thursday = ?6,
               friday = ?7, saturday = ?8, sunday = ?9
           WHERE id = ?10",
          params![begin, end, mon, tue, wed, thu, fri, sat, sun, id.0],
        )?;
        if n == 0 {
          return Ok(false);
        }
        update_base(&tx, &rule.base)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    found(id, touched)?;
    tracing::debug!(id = id.0, "saved schedule rule");
    Ok(())
  }

  async fn set_enabled(&self, id: RuleId, enabled: bool) -> Result<()> {
    let touched = self
      .conn
      .call(move |conn| {
        Ok(
          conn.execute(
            "UPDATE rules SET enabled = ?1 WHERE id = ?2",
            params![enabled, id.0],
          )? > 0,
        )
      })
      .await?;
    found(id, touched)?;
    tracing::debug!(id = id.0, enabled, "toggled rule");
    Ok(())
  }

  async fn delete_rule(&self, id: RuleId) -> Result<()> {
    if id.is_new() {
      return Err(Error::RuleNotFound(id));
    }
    let touched = self
      .conn
      .call(move |conn| {
        let existed = conn
          .query_row("SELECT 1 FROM rules WHERE id = ?1", params![id.0], |_| Ok(()))
          .optional()?
          .is_some();
        if existed {
          // Extension and child rows go with it via ON DELETE CASCADE.
          conn.execute("DELETE FROM rules WHERE id = ?1", params![id.0])?;
        }
        Ok(existed)
      })
      .await?;
    found(id, touched)?;
    tracing::debug!(id = id.0, "deleted rule");
    Ok(())
  }
}
