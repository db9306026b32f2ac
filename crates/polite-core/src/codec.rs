//! Versioned binary encoding of rules.
//!
//! Used to hand a rule between processes or to stash an in-progress edit.
//! All integers are big-endian. Layout (version 1):
//!
//! ```text
//! u8 version | u8 kind | i64 id | str name | u8 enabled | u8 vibrate
//! calendar: u32 n, n × i64 calendar id | u8 match flags | u8 inverse
//!           | u32 n, n × str keyword
//! schedule: u16 begin | u16 end | u8 day mask
//! ```
//!
//! `str` is a `u32` byte length followed by UTF-8. Match flags use bit 0 for
//! "all", bit 1 for "title", bit 2 for "description".

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
  Error, Result,
  days::DaySet,
  match_by::{CalendarEventMatchBy, Keywords},
  rule::{CalendarRule, Rule, RuleBase, RuleId, ScheduleRule},
  time::TimeOfDay,
};

pub const VERSION: u8 = 1;

const KIND_CALENDAR: u8 = 1;
const KIND_SCHEDULE: u8 = 2;

// ─── Encode ──────────────────────────────────────────────────────────────────

pub fn encode(rule: &Rule) -> Bytes {
  let mut buf = BytesMut::new();
  buf.put_u8(VERSION);
  match rule {
    Rule::Calendar(r) => {
      buf.put_u8(KIND_CALENDAR);
      put_base(&mut buf, &r.base);
      put_len(&mut buf, r.calendar_ids.len());
      for id in &r.calendar_ids {
        buf.put_i64(*id);
      }
      let (all, title, description) = r.match_by.flags();
      buf.put_u8(u8::from(all) | u8::from(title) << 1 | u8::from(description) << 2);
      buf.put_u8(u8::from(r.inverse_match));
      put_len(&mut buf, r.keywords.len());
      for word in r.keywords.iter() {
        put_str(&mut buf, word);
      }
    }
    Rule::Schedule(r) => {
      buf.put_u8(KIND_SCHEDULE);
      put_base(&mut buf, &r.base);
      buf.put_u16(r.begin.minutes() as u16);
      buf.put_u16(r.end.minutes() as u16);
      buf.put_u8(r.days.mask());
    }
  }
  buf.freeze()
}

fn put_base(buf: &mut BytesMut, base: &RuleBase) {
  buf.put_i64(base.id.0);
  put_str(buf, &base.name);
  buf.put_u8(u8::from(base.enabled));
  buf.put_u8(u8::from(base.vibrate));
}

fn put_len(buf: &mut BytesMut, len: usize) {
  // Collections and names never approach 4 GiB.
  buf.put_u32(len as u32);
}

fn put_str(buf: &mut BytesMut, s: &str) {
  put_len(buf, s.len());
  buf.put_slice(s.as_bytes());
}

// ─── Decode ──────────────────────────────────────────────────────────────────

/// Decode a rule produced by [`encode`]. The whole input must be consumed.
pub fn decode(mut buf: &[u8]) -> Result<Rule> {
  let version = get_u8(&mut buf)?;
  if version != VERSION {
    return Err(Error::UnsupportedVersion(version));
  }

  let kind = get_u8(&mut buf)?;
  let rule = match kind {
    KIND_CALENDAR => {
      let base = get_base(&mut buf)?;
      let n = get_len(&mut buf)?;
      let mut calendar_ids = Vec::with_capacity(n.min(buf.remaining() / 8));
      for _ in 0..n {
        need(&buf, 8)?;
        calendar_ids.push(buf.get_i64());
      }
      let flags = get_u8(&mut buf)?;
      if flags & !0b111 != 0 {
        return Err(Error::Codec(format!("unknown match flags {flags:#04b}")));
      }
      let match_by = CalendarEventMatchBy::from_flags(
        flags & 0b001 != 0,
        flags & 0b010 != 0,
        flags & 0b100 != 0,
      )?;
      let inverse_match = get_bool(&mut buf)?;
      let n = get_len(&mut buf)?;
      let mut keywords = Keywords::new();
      for _ in 0..n {
        keywords.insert(&get_str(&mut buf)?);
      }
      Rule::Calendar(CalendarRule {
        base,
        calendar_ids,
        match_by,
        inverse_match,
        keywords,
      })
    }
    KIND_SCHEDULE => {
      let base = get_base(&mut buf)?;
      let begin = get_time(&mut buf)?;
      let end = get_time(&mut buf)?;
      let mask = get_u8(&mut buf)?;
      let days = DaySet::from_mask(mask)
        .ok_or_else(|| Error::Codec(format!("invalid day mask {mask:#09b}")))?;
      Rule::Schedule(ScheduleRule { base, begin, end, days })
    }
    other => return Err(Error::Codec(format!("unknown rule kind {other}"))),
  };

  if buf.has_remaining() {
    return Err(Error::Codec(format!("{} trailing bytes", buf.remaining())));
  }
  Ok(rule)
}

fn need(buf: &&[u8], n: usize) -> Result<()> {
  if buf.remaining() < n {
    return Err(Error::Codec("unexpected end of input".into()));
  }
  Ok(())
}

fn get_u8(buf: &mut &[u8]) -> Result<u8> {
  need(buf, 1)?;
  Ok(buf.get_u8())
}

fn get_bool(buf: &mut &[u8]) -> Result<bool> {
  match get_u8(buf)? {
    0 => Ok(false),
    1 => Ok(true),
    b => Err(Error::Codec(format!("invalid boolean byte {b}"))),
  }
}

fn get_len(buf: &mut &[u8]) -> Result<usize> {
  need(buf, 4)?;
  Ok(buf.get_u32() as usize)
}

fn get_str(buf: &mut &[u8]) -> Result<String> {
  let len = get_len(buf)?;
  need(buf, len)?;
  let bytes = buf.copy_to_bytes(len);
  String::from_utf8(bytes.to_vec())
    .map_err(|e| Error::Codec(format!("invalid utf-8: {e}")))
}

fn get_time(buf: &mut &[u8]) -> Result<TimeOfDay> {
  need(buf, 2)?;
  TimeOfDay::from_minutes(u32::from(buf.get_u16()))
}

fn get_base(buf: &mut &[u8]) -> Result<RuleBase> {
  need(buf, 8)?;
  let id = RuleId(buf.get_i64());
  let name = get_str(buf)?;
  let enabled = get_bool(buf)?;
  let vibrate = get_bool(buf)?;
  Ok(RuleBase { id, name, enabled, vibrate })
}

#[cfg(test)]
mod tests {
  use chrono::Weekday;

  use super::*;

  fn calendar() -> Rule {
    let mut r = CalendarRule::new("Meetings");
    r.base.id = RuleId(12);
    r.base.vibrate = true;
    r.calendar_ids = vec![5, 3, 9];
    r.match_by = CalendarEventMatchBy::TitleAndDescription;
    r.inverse_match = true;
    r.keywords = ["Sync", "1:1", "Planning"].into_iter().collect();
    r.into()
  }

  fn schedule() -> Rule {
    let mut r = ScheduleRule::new("Sleep");
    r.base.enabled = false;
    r.begin = TimeOfDay::new(22, 30).unwrap();
    r.end = TimeOfDay::new(6, 45).unwrap();
    r.days = DaySet::EMPTY.with(Weekday::Sun).with(Weekday::Wed);
    r.into()
  }

  #[test]
  fn calendar_rule_survives_encoding() {
    let rule = calendar();
    assert_eq!(decode(&encode(&rule)).unwrap(), rule);
  }

  #[test]
  fn schedule_rule_survives_encoding() {
    let rule = schedule();
    assert_eq!(decode(&encode(&rule)).unwrap(), rule);
  }

  #[test]
  fn header_layout() {
    let bytes = encode(&schedule());
    assert_eq!(bytes[0], VERSION);
    assert_eq!(bytes[1], KIND_SCHEDULE);
    assert_eq!(&bytes[2..10], &(-1_i64).to_be_bytes());
  }

  #[test]
  fn rejects_unknown_version() {
    let mut bytes = encode(&schedule()).to_vec();
    bytes[0] = 9;
    assert!(matches!(decode(&bytes), Err(Error::UnsupportedVersion(9))));
  }

  #[test]
  fn rejects_unknown_kind() {
    let mut bytes = encode(&schedule()).to_vec();
    bytes[1] = 7;
    assert!(matches!(decode(&bytes), Err(Error::Codec(_))));
  }

  #[test]
  fn rejects_truncated_input() {
    let bytes = encode(&calendar());
    for cut in [0, 1, 5, bytes.len() - 1] {
      assert!(decode(&bytes[..cut]).is_err(), "cut at {cut}");
    }
  }

  #[test]
  fn rejects_trailing_bytes() {
    let mut bytes = encode(&calendar()).to_vec();
    bytes.push(0);
    assert!(matches!(decode(&bytes), Err(Error::Codec(_))));
  }

  #[test]
  fn rejects_impossible_match_flags() {
    let mut r = CalendarRule::new("x");
    r.match_by = CalendarEventMatchBy::Title;
    let mut bytes = encode(&r.into()).to_vec();
    // version, kind, id, name (4 + 1), enabled, vibrate, calendar count
    let flags_at = 1 + 1 + 8 + 4 + 1 + 1 + 1 + 4;
    assert_eq!(bytes[flags_at], 0b010);
    bytes[flags_at] = 0b011;
    assert!(matches!(
      decode(&bytes),
      Err(Error::MalformedMatchMode { all: true, title: true, .. })
    ));
  }

  #[test]
  fn rejects_out_of_range_time() {
    let mut bytes = encode(&schedule()).to_vec();
    let end_at = bytes.len() - 3;
    bytes[end_at..end_at + 2].copy_from_slice(&1440_u16.to_be_bytes());
    assert!(matches!(decode(&bytes), Err(Error::InvalidTimeOfDay(1440))));
  }

  #[test]
  fn rejects_invalid_utf8_name() {
    let mut bytes = encode(&schedule()).to_vec();
    // version, kind, id, u32 length, then "Sleep".
    bytes[14] = 0xff;
    assert!(matches!(decode(&bytes), Err(Error::Codec(m)) if m.contains("utf-8")));
  }

  #[test]
  fn rejects_high_bit_day_mask() {
    let mut bytes = encode(&schedule()).to_vec();
    let last = bytes.len() - 1;
    bytes[last] |= 0x80;
    assert!(matches!(decode(&bytes), Err(Error::Codec(m)) if m.contains("day mask")));
  }

  #[test]
  fn rejects_non_boolean_flag_byte() {
    let mut bytes = encode(&schedule()).to_vec();
    // The enabled byte follows the five-byte name.
    assert_eq!(bytes[19], 0);
    bytes[19] = 2;
    assert!(matches!(decode(&bytes), Err(Error::Codec(m)) if m.contains("boolean")));
  }
}
