//! Error type for `polite-store-sqlite`.

use polite_core::rule::RuleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Stored data failed domain validation, e.g. impossible match flags.
  #[error("rule {id}: {source}")]
  Corrupt {
    id:     RuleId,
    #[source]
    source: polite_core::Error,
  },

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Saving, toggling, or deleting a rule that is not stored (including
  /// [`RuleId::NEW`]).
  #[error("rule not found: {0}")]
  RuleNotFound(RuleId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
