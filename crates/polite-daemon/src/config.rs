//! Runtime configuration, layered from an optional TOML file and `POLITE_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

/// Daemon settings, deserialised from `polite.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
  /// SQLite database holding the rules. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// JSON file listing calendar events. Without it no calendar rule can
  /// trigger.
  #[serde(default)]
  pub events_path:        Option<PathBuf>,
  #[serde(default = "default_poll_interval_secs")]
  pub poll_interval_secs: u64,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/polite/rules.db") }

fn default_poll_interval_secs() -> u64 { 60 }

impl Default for DaemonConfig {
  fn default() -> Self {
    Self {
      store_path:         default_store_path(),
      events_path:        None,
      poll_interval_secs: default_poll_interval_secs(),
    }
  }
}

impl DaemonConfig {
  /// Read `path` (if it exists) and overlay `POLITE_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("POLITE"))
      .build()
      .context("failed to read config file")?;
    Self::from_settings(settings)
  }

  /// Parse settings from an in-memory TOML document.
  pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .context("failed to parse config")?;
    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise DaemonConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.events_path = cfg.events_path.as_deref().map(expand_tilde);
    Ok(cfg)
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs.max(1))
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
