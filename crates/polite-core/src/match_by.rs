//! Keyword matching of calendar events.
//!
//! A calendar rule selects which event text it searches with a
//! [`CalendarEventMatchBy`] mode and searches it for any of its [`Keywords`].
//! Matching is a case-insensitive substring test.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Match mode ──────────────────────────────────────────────────────────────

/// Which event fields a calendar rule checks against its keywords.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CalendarEventMatchBy {
  /// Every event matches; keywords are not consulted.
  #[default]
  All,
  Title,
  Description,
  /// Either field may contain the keyword.
  TitleAndDescription,
}

impl CalendarEventMatchBy {
  /// The `(all, title, description)` flags stored for this mode.
  pub fn flags(self) -> (bool, bool, bool) {
    match self {
      Self::All => (true, false, false),
      Self::Title => (false, true, false),
      Self::Description => (false, false, true),
      Self::TitleAndDescription => (false, true, true),
    }
  }

  /// Rebuild a mode from its stored flags. Any combination not produced by
  /// [`Self::flags`] is rejected, including all three flags unset.
  pub fn from_flags(all: bool, title: bool, description: bool) -> Result<Self> {
    match (all, title, description) {
      (true, false, false) => Ok(Self::All),
      (false, true, false) => Ok(Self::Title),
      (false, false, true) => Ok(Self::Description),
      (false, true, true) => Ok(Self::TitleAndDescription),
      _ => Err(Error::MalformedMatchMode { all, title, description }),
    }
  }

  pub fn is_all(self) -> bool { self == Self::All }

  pub fn searches_title(self) -> bool { self.flags().1 }

  pub fn searches_description(self) -> bool { self.flags().2 }

  /// Whether an event with the given text fields matches.
  ///
  /// [`Self::All`] matches every event and ignores `inverse`. For every other
  /// mode the keyword predicate is computed and then flipped when `inverse`
  /// is set; an empty keyword set never matches before inversion.
  pub fn matches(
    self,
    title: Option<&str>,
    description: Option<&str>,
    keywords: &Keywords,
    inverse: bool,
  ) -> bool {
    if self.is_all() {
      return true;
    }
    let hit = (self.searches_title() && keywords.found_in(title))
      || (self.searches_description() && keywords.found_in(description));
    hit != inverse
  }
}

// ─── Keywords ────────────────────────────────────────────────────────────────

/// A sorted set of lower-cased keywords.
///
/// Entries are trimmed and lower-cased on insertion, so the set contents are
/// already in the form they are matched, stored, and displayed in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Keywords(BTreeSet<String>);

impl Keywords {
  pub fn new() -> Self { Self::default() }

  /// Normalise and add a keyword. Returns `false` if it was blank or already
  /// present.
  pub fn insert(&mut self, word: &str) -> bool {
    let word = normalize(word);
    if word.is_empty() {
      return false;
    }
    self.0.insert(word)
  }

  pub fn remove(&mut self, word: &str) -> bool { self.0.remove(&normalize(word)) }

  pub fn clear(&mut self) { self.0.clear(); }

  pub fn contains(&self, word: &str) -> bool { self.0.contains(&normalize(word)) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }

  /// Keywords joined with `", "` in sorted order; empty when there are none.
  pub fn caption(&self) -> String {
    self.iter().collect::<Vec<_>>().join(", ")
  }

  /// True iff any keyword occurs in `text`. Absent text never matches.
  pub fn found_in(&self, text: Option<&str>) -> bool {
    let Some(text) = text else { return false };
    if self.0.is_empty() {
      return false;
    }
    let haystack = fold_case(text);
    self.0.iter().any(|k| haystack.contains(k.as_str()))
  }
}

fn normalize(word: &str) -> String { fold_case(word.trim()) }

/// Per-character lowercasing. Unlike `str::to_lowercase` this ignores word
/// position, so a capital sigma always folds to `σ`.
fn fold_case(text: &str) -> String {
  text.chars().flat_map(char::to_lowercase).collect()
}

impl<S: AsRef<str>> FromIterator<S> for Keywords {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut keywords = Self::new();
    for word in iter {
      keywords.insert(word.as_ref());
    }
    keywords
  }
}

impl From<Vec<String>> for Keywords {
  fn from(words: Vec<String>) -> Self { words.into_iter().collect() }
}

impl From<Keywords> for Vec<String> {
  fn from(keywords: Keywords) -> Self { keywords.0.into_iter().collect() }
}
