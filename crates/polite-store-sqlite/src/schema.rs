//! SQL schema for the Polite SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

-- Fields shared by every rule kind.
CREATE TABLE IF NOT EXISTS rules (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT    NOT NULL,
    enabled  INTEGER NOT NULL,
    vibrate  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS calendar_rules (
    id                 INTEGER PRIMARY KEY REFERENCES rules(id) ON DELETE CASCADE,
    match_all          INTEGER NOT NULL,
    match_title        INTEGER NOT NULL,
    match_description  INTEGER NOT NULL,
    inverse_match      INTEGER NOT NULL
);

-- Calendars a rule is restricted to; none means every calendar.
-- Rows are read back in rowid order to keep the user's ordering.
CREATE TABLE IF NOT EXISTS calendar_rule_calendars (
    rule_id      INTEGER NOT NULL REFERENCES calendar_rules(id) ON DELETE CASCADE,
    calendar_id  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS calendar_rule_keywords (
    rule_id  INTEGER NOT NULL REFERENCES calendar_rules(id) ON DELETE CASCADE,
    word     TEXT    NOT NULL,
    UNIQUE (rule_id, word)
);

CREATE TABLE IF NOT EXISTS schedule_rules (
    id             INTEGER PRIMARY KEY REFERENCES rules(id) ON DELETE CASCADE,
    begin_minutes  INTEGER NOT NULL CHECK (begin_minutes BETWEEN 0 AND 1439),
    end_minutes    INTEGER NOT NULL CHECK (end_minutes   BETWEEN 0 AND 1439),
    monday         INTEGER NOT NULL,
    tuesday        INTEGER NOT NULL,
    wednesday      INTEGER NOT NULL,
    thursday       INTEGER NOT NULL,
    friday         INTEGER NOT NULL,
    saturday       INTEGER NOT NULL,
    sunday         INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS calendar_rule_calendars_rule_idx
    ON calendar_rule_calendars(rule_id);
CREATE INDEX IF NOT EXISTS calendar_rule_keywords_rule_idx
    ON calendar_rule_keywords(rule_id);

PRAGMA user_version = 1;
";
