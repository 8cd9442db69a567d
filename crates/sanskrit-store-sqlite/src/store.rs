//! [`SanskritDb`]: transactional persistence of document nodes.

use std::{collections::VecDeque, path::Path, sync::Arc, time::Duration};

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use sanskrit_core::{ChangeSet, Identifier, Node, NodeCache, NodeField, NodeFields};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::{
  Error, Result, StoreConfig,
  encode::{RawContributor, RawNode, column},
  pool::{ConnectionManager, transact},
  schema::TABLES,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Every operation runs in one transaction on one pooled connection. All
/// operations on the same store (and its clones) are serialised by a
/// store-wide lock, so the existence check and the write inside
/// [`store_node`](Self::store_node) or [`patch_node`](Self::patch_node) never
/// interleave with another caller's.
///
/// Cloning is cheap; clones share the pool and the lock.
#[derive(Clone)]
pub struct SanskritDb {
  pool: ConnectionManager,
  lock: Arc<Mutex<()>>,
}

impl SanskritDb {
  pub async fn open(config: &StoreConfig) -> Result<Self> {
    Self::sqlite(config.max_connections, &config.database, config.timeout()).await
  }

  /// Open (or create) a store at `path` and create its tables.
  pub async fn sqlite(
    max_connections: usize,
    path: impl AsRef<Path>,
    timeout: Duration,
  ) -> Result<Self> {
    let pool = ConnectionManager::sqlite(max_connections, path, timeout)?;
    let store = Self { pool, lock: Arc::default() };
    store.create_tables().await?;
    Ok(store)
  }

  pub fn pool(&self) -> &ConnectionManager { &self.pool }

  async fn create_tables(&self) -> Result<()> {
    trace!(path = ?self.pool.path(), "creating tables");
    for sql in TABLES {
      self.pool.execute(sql).await?;
    }
    Ok(())
  }

  pub async fn node_exists(&self, uuid: &Identifier) -> Result<bool> {
    let id = uuid.to_string();
    let _guard = self.lock.lock().await;
    self.pool.call(move |conn| Ok(exists(conn, &id)?)).await
  }

  /// Persist the whole node, replacing any stored children and contributors.
  ///
  /// The caller's dirty record is left alone.
  pub async fn store_node(&self, node: &Node) -> Result<()> {
    trace!(uuid = %node.uuid(), "storing node");
    let raw = RawNode::from_node(node);

    let _guard = self.lock.lock().await;
    self
      .pool
      .call(move |conn| {
        transact(conn, TransactionBehavior::Immediate, |tx| {
          let existed = exists(tx, &raw.uuid)?;
          write_full(tx, &raw, existed)
        })?;
        Ok(())
      })
      .await
  }

  /// Persist only what changed since the last successful patch, then clear
  /// the node's dirty record. A node that has never been stored is stored in
  /// full.
  pub async fn patch_node(&self, node: &mut Node) -> Result<()> {
    let changes = node.dirty();
    self.apply_changes(node, changes).await?;
    node.clear_dirty();
    Ok(())
  }

  /// Write the fields named in `changes` from `node`. Does not touch the
  /// node's dirty record.
  pub async fn apply_changes(&self, node: &Node, changes: ChangeSet) -> Result<()> {
    debug!(uuid = %node.uuid(), ?changes, "patching node");
    let raw = RawNode::from_node(node);

    let _guard = self.lock.lock().await;
    self
      .pool
      .call(move |conn| {
        transact(conn, TransactionBehavior::Immediate, |tx| write_patch(tx, &raw, changes))?;
        Ok(())
      })
      .await
  }

  /// Patch several nodes in one transaction. Either every node is written
  /// and has its dirty record cleared, or nothing is written and every
  /// dirty record is kept.
  pub async fn patch_nodes(&self, nodes: &mut [&mut Node]) -> Result<()> {
    let batch: Vec<(RawNode, ChangeSet)> = nodes
      .iter()
      .map(|node| (RawNode::from_node(node), node.dirty()))
      .collect();
    debug!(count = batch.len(), "patching nodes");

    {
      let _guard = self.lock.lock().await;
      self
        .pool
        .call(move |conn| {
          transact(conn, TransactionBehavior::Immediate, |tx| {
            for (raw, changes) in &batch {
              write_patch(tx, raw, *changes)?;
            }
            Ok(())
          })?;
          Ok(())
        })
        .await?;
    }

    for node in nodes.iter_mut() {
      node.clear_dirty();
    }
    Ok(())
  }

  /// Load a node with its children and contributors in stored order.
  pub async fn retrieve_node(&self, uuid: &Identifier) -> Result<Node> {
    trace!(%uuid, "retrieving node");
    let id = uuid.to_string();

    let raw = {
      let _guard = self.lock.lock().await;
      self
        .pool
        .call(move |conn| {
          Ok(transact(conn, TransactionBehavior::Deferred, |tx| read_node(tx, &id))?)
        })
        .await
        .map_err(|e| match e {
          Error::Database(source) => Error::Read { id: uuid.clone(), source },
          other => other,
        })?
    };

    raw
      .ok_or_else(|| Error::NodeNotFound(uuid.clone()))?
      .into_node()
      .map_err(|e| match e {
        Error::Core(source) => Error::Decode { id: uuid.clone(), source },
        other => other,
      })
  }

  /// Load the stored subtree under `root` into a [`NodeCache`].
  ///
  /// Each identifier is loaded once. Children that were never stored are
  /// skipped; a missing `root` is an error.
  pub async fn load_tree(&self, root: &Identifier) -> Result<NodeCache> {
    let mut cache = NodeCache::new();
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(uuid) = queue.pop_front() {
      if cache.contains(&uuid) {
        continue;
      }
      match self.retrieve_node(&uuid).await {
        Ok(node) => {
          queue.extend(node.children().iter().filter(|c| !cache.contains(c)).cloned());
          cache.insert(node);
        }
        Err(Error::NodeNotFound(missing)) if missing != *root => {
          debug!(uuid = %missing, "skipping dangling child reference");
        }
        Err(e) => return Err(e),
      }
    }

    Ok(cache)
  }
}

// ─── Statements ──────────────────────────────────────────────────────────────

fn exists(conn: &rusqlite::Connection, uuid: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM nodes WHERE uuid = ?1", [uuid], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

/// Write `changes` to a stored node, or the whole node if it is new.
fn write_patch(
  conn: &rusqlite::Connection,
  raw: &RawNode,
  changes: ChangeSet,
) -> rusqlite::Result<()> {
  if exists(conn, &raw.uuid)? {
    write_changes(conn, raw, changes)
  } else {
    trace!(uuid = %raw.uuid, "node not stored yet, writing in full");
    write_full(conn, raw, false)
  }
}

/// Upsert the node row and replace both relation lists.
fn write_full(conn: &rusqlite::Connection, raw: &RawNode, existed: bool) -> rusqlite::Result<()> {
  let f = &raw.fields;
  conn.execute(
    "INSERT INTO nodes (uuid, title, subtitle, manuscript, description, summary, notes)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(uuid) DO UPDATE SET
       title       = excluded.title,
       subtitle    = excluded.subtitle,
       manuscript  = excluded.manuscript,
       description = excluded.description,
       summary     = excluded.summary,
       notes       = excluded.notes",
    rusqlite::params![
      raw.uuid,
      f.title,
      f.subtitle,
      f.manuscript,
      f.description,
      f.summary,
      f.notes,
    ],
  )?;

  if existed {
    trace!(uuid = %raw.uuid, "node exists, deleting child and contributor rows");
    delete_children(conn, &raw.uuid)?;
    delete_contributors(conn, &raw.uuid)?;
  }

  insert_children(conn, &raw.uuid, &raw.children)?;
  insert_contributors(conn, &raw.uuid, &raw.contributors)?;
  Ok(())
}

/// Update only the columns and relation lists named in `changes`.
fn write_changes(
  conn: &rusqlite::Connection,
  raw: &RawNode,
  changes: ChangeSet,
) -> rusqlite::Result<()> {
  if changes.has_scalars() {
    let scalars: Vec<NodeField> = changes.iter().filter(|f| f.is_scalar()).collect();
    let assignments = scalars
      .iter()
      .filter_map(|f| column(*f))
      .enumerate()
      .map(|(i, col)| format!("{col} = ?{}", i + 2))
      .collect::<Vec<_>>()
      .join(", ");

    let params = std::iter::once(raw.uuid.as_str())
      .chain(scalars.iter().map(|f| raw.text(*f)));

    conn.execute(
      &format!("UPDATE nodes SET {assignments} WHERE uuid = ?1"),
      rusqlite::params_from_iter(params),
    )?;
  }

  if changes.contains(NodeField::Children) {
    delete_children(conn, &raw.uuid)?;
    insert_children(conn, &raw.uuid, &raw.children)?;
  }

  if changes.contains(NodeField::Contributors) {
    delete_contributors(conn, &raw.uuid)?;
    insert_contributors(conn, &raw.uuid, &raw.contributors)?;
  }

  Ok(())
}

fn delete_children(conn: &rusqlite::Connection, parent: &str) -> rusqlite::Result<usize> {
  conn.execute("DELETE FROM children WHERE parent_uuid = ?1", [parent])
}

fn delete_contributors(conn: &rusqlite::Connection, parent: &str) -> rusqlite::Result<usize> {
  conn.execute("DELETE FROM contributors WHERE parent_uuid = ?1", [parent])
}

fn insert_children(
  conn: &rusqlite::Connection,
  parent: &str,
  children: &[String],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO children (parent_uuid, child_uuid, seq) VALUES (?1, ?2, ?3)",
  )?;
  for (seq, child) in children.iter().enumerate() {
    trace!(parent, child = %child, "creating parent/child relationship");
    stmt.execute(rusqlite::params![parent, child, seq as i64])?;
  }
  Ok(())
}

fn insert_contributors(
  conn: &rusqlite::Connection,
  parent: &str,
  contributors: &[RawContributor],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO contributors (parent_uuid, name, sort_by_name, role, seq)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  for (seq, c) in contributors.iter().enumerate() {
    trace!(parent, contributor = %c.sort_by_name, "adding contributor");
    stmt.execute(rusqlite::params![parent, c.name, c.sort_by_name, c.role, seq as i64])?;
  }
  Ok(())
}

fn read_node(conn: &rusqlite::Connection, uuid: &str) -> rusqlite::Result<Option<RawNode>> {
  let fields = conn
    .query_row(
      "SELECT title, subtitle, manuscript, description, summary, notes
       FROM nodes WHERE uuid = ?1",
      [uuid],
      |row| {
        Ok(NodeFields {
          title:       row.get(0)?,
          subtitle:    row.get(1)?,
          manuscript:  row.get(2)?,
          description: row.get(3)?,
          summary:     row.get(4)?,
          notes:       row.get(5)?,
        })
      },
    )
    .optional()?;

  let Some(fields) = fields else {
    return Ok(None);
  };

  let children = conn
    .prepare("SELECT child_uuid FROM children WHERE parent_uuid = ?1 ORDER BY seq")?
    .query_map([uuid], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  let contributors = conn
    .prepare(
      "SELECT name, sort_by_name, role FROM contributors
       WHERE parent_uuid = ?1 ORDER BY seq",
    )?
    .query_map([uuid], |row| {
      Ok(RawContributor {
        name:         row.get(0)?,
        sort_by_name: row.get(1)?,
        role:         row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(RawNode { uuid: uuid.to_owned(), fields, children, contributors }))
}
