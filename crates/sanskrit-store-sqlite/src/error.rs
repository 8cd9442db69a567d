//! Error type for `sanskrit-store-sqlite`.

use std::{path::PathBuf, time::Duration};

use sanskrit_core::Identifier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sanskrit_core::Error),

  /// The database file could not be opened or configured.
  #[error("cannot connect to {path:?}: {source}")]
  Connection {
    path:   PathBuf,
    #[source]
    source: tokio_rusqlite::Error,
  },

  /// No connection became available within the configured timeout.
  #[error("timed out after {0:?} waiting for a database connection")]
  ConnectionTimeout(Duration),

  #[error("connection pool must allow at least one connection")]
  InvalidPoolSize,

  #[error("node not found: {0}")]
  NodeNotFound(Identifier),

  /// Schema creation or a write failed; the transaction was rolled back.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored row could not be turned back into a node.
  #[error("failed to decode node {id}: {source}")]
  Decode {
    id:     Identifier,
    #[source]
    source: sanskrit_core::Error,
  },

  #[error("failed to read node {id}: {source}")]
  Read {
    id:     Identifier,
    #[source]
    source: tokio_rusqlite::Error,
  },
}

impl Error {
  /// Only pool admission timeouts are safe to retry blindly.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::ConnectionTimeout(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
