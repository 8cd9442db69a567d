//! Store configuration, deserialised by the front end from file/env layers.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

fn default_max_connections() -> usize { 4 }

fn default_timeout_ms() -> u64 { 60_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Path of the SQLite file; created on first open.
  pub database:        PathBuf,
  /// Upper bound on simultaneously open connections.
  #[serde(default = "default_max_connections")]
  pub max_connections: usize,
  /// How long `connect` waits for a free slot before giving up.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms:      u64,
}

impl StoreConfig {
  pub fn new(database: impl Into<PathBuf>) -> Self {
    Self {
      database:        database.into(),
      max_connections: default_max_connections(),
      timeout_ms:      default_timeout_ms(),
    }
  }

  pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}
