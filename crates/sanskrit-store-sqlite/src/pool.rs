//! [`ConnectionManager`]: bounded admission to a single SQLite file.
//!
//! There is no free list: every checkout opens a fresh physical connection
//! and every release closes it. The bound is enforced by a semaphore, so at
//! most `max_connections` connections are open at once and a caller that
//! cannot get a slot within the timeout fails with
//! [`Error::ConnectionTimeout`].

use std::{
  ops::Deref,
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use rusqlite::{Transaction, TransactionBehavior};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// SQLite takes its busy timeout as an `i32` of milliseconds.
const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Cloning is cheap; clones share the same admission bound.
#[derive(Clone)]
pub struct ConnectionManager {
  inner: Arc<Inner>,
}

struct Inner {
  path:            PathBuf,
  max_connections: usize,
  timeout:         Duration,
  permits:         Arc<Semaphore>,
  in_flight:       AtomicUsize,
}

impl ConnectionManager {
  /// Manage connections to the SQLite file at `path`. Nothing is opened
  /// until the first [`connect`](Self::connect).
  pub fn sqlite(
    max_connections: usize,
    path: impl AsRef<Path>,
    timeout: Duration,
  ) -> Result<Self> {
    if max_connections == 0 {
      return Err(Error::InvalidPoolSize);
    }

    Ok(Self {
      inner: Arc::new(Inner {
        path: path.as_ref().to_path_buf(),
        max_connections,
        timeout,
        permits: Arc::new(Semaphore::new(max_connections)),
        in_flight: AtomicUsize::new(0),
      }),
    })
  }

  pub fn path(&self) -> &Path { &self.inner.path }

  pub fn max_connections(&self) -> usize { self.inner.max_connections }

  pub fn timeout(&self) -> Duration { self.inner.timeout }

  /// Connections currently checked out.
  pub fn in_flight(&self) -> usize { self.inner.in_flight.load(Ordering::SeqCst) }

  /// Wait for a free slot, then open and configure a new connection.
  pub async fn connect(&self) -> Result<PooledConnection> {
    let inner = &self.inner;

    if inner.permits.available_permits() == 0 {
      trace!(
        max = inner.max_connections,
        current = self.in_flight(),
        "waiting for available connection"
      );
    }

    // The semaphore is never closed, so the only failure is the deadline.
    let permit = tokio::time::timeout(inner.timeout, inner.permits.clone().acquire_owned())
      .await
      .ok()
      .and_then(|acquired| acquired.ok())
      .ok_or(Error::ConnectionTimeout(inner.timeout))?;

    // From here on, dropping `slot` hands the permit back.
    let slot = Slot::new(permit, self.inner.clone());
    trace!(count = self.in_flight(), "connection slot acquired");

    let connection_error =
      |source: tokio_rusqlite::Error| Error::Connection { path: inner.path.clone(), source };

    let conn = tokio_rusqlite::Connection::open(inner.path.clone())
      .await
      .map_err(connection_error)?;

    let busy = inner.timeout.min(MAX_BUSY_TIMEOUT);
    conn
      .call(move |conn| {
        conn.busy_timeout(busy)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
          row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(())
      })
      .await
      .map_err(connection_error)?;

    Ok(PooledConnection { conn, slot })
  }

  /// Close `conn` and free its slot. The slot is freed even if closing
  /// fails.
  pub async fn release(&self, conn: PooledConnection) -> Result<()> {
    trace!("releasing connection");
    let PooledConnection { conn, slot } = conn;
    let closed = conn.close().await;
    drop(slot);

    if let Err(e) = &closed {
      warn!(error = %e, "failed to close database connection");
    }
    Ok(closed?)
  }

  /// Check out a connection, run `function` on it, and release it on every
  /// path. An error from `function` takes precedence over a close error.
  pub async fn call<F, R>(&self, function: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    let conn = self.connect().await?;
    let outcome = conn.call(function).await;
    let released = self.release(conn).await;

    let value = outcome?;
    released?;
    Ok(value)
  }

  /// Run a statement batch (typically DDL) in its own transaction.
  pub async fn execute(&self, sql: &str) -> Result<()> {
    debug!(sql, "executing SQL");
    let sql = sql.to_owned();
    self
      .call(move |conn| {
        transact(conn, TransactionBehavior::Immediate, |tx| tx.execute_batch(&sql))?;
        Ok(())
      })
      .await
  }
}

/// Run `body` in a transaction: commit on success, roll back on failure.
pub(crate) fn transact<R>(
  conn: &mut rusqlite::Connection,
  behavior: TransactionBehavior,
  body: impl FnOnce(&Transaction<'_>) -> rusqlite::Result<R>,
) -> rusqlite::Result<R> {
  let tx = conn.transaction_with_behavior(behavior)?;

  match body(&tx) {
    Ok(value) => {
      tx.commit()?;
      Ok(value)
    }
    Err(e) => {
      debug!(error = %e, "rolling back transaction");
      if let Err(rollback) = tx.rollback() {
        warn!(error = %rollback, "rollback failed");
      }
      Err(e)
    }
  }
}

// ─── Checked-out connection ──────────────────────────────────────────────────

/// A connection holding one admission slot.
///
/// Prefer [`ConnectionManager::release`]; simply dropping the value also
/// frees the slot, and the connection closes once its worker thread sees the
/// last handle go away.
pub struct PooledConnection {
  conn: tokio_rusqlite::Connection,
  slot: Slot,
}

impl Deref for PooledConnection {
  type Target = tokio_rusqlite::Connection;

  fn deref(&self) -> &Self::Target { &self.conn }
}

struct Slot {
  _permit: OwnedSemaphorePermit,
  inner:   Arc<Inner>,
}

impl Slot {
  fn new(permit: OwnedSemaphorePermit, inner: Arc<Inner>) -> Self {
    inner.in_flight.fetch_add(1, Ordering::SeqCst);
    Self { _permit: permit, inner }
  }
}

impl Drop for Slot {
  fn drop(&mut self) {
    // Saturate at zero rather than wrap.
    let _ = self
      .inner
      .in_flight
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    trace!(count = self.inner.in_flight.load(Ordering::SeqCst), "connection slot freed");
  }
}
