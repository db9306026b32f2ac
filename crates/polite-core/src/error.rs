//! Error types for `polite-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("time of day out of range: {0} minutes")]
  InvalidTimeOfDay(u32),

  #[error("invalid time of day: {0:?}")]
  ParseTimeOfDay(String),

  #[error(
    "malformed match mode: all={all}, title={title}, description={description}"
  )]
  MalformedMatchMode {
    all:         bool,
    title:       bool,
    description: bool,
  },

  #[error("malformed rule encoding: {0}")]
  Codec(String),

  #[error("unsupported rule encoding version: {0}")]
  UnsupportedVersion(u8),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
