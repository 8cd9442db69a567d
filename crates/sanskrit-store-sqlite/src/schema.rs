//! SQL schema for the Sanskrit SQLite store.
//!
//! One statement per table, each idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`. Contributor roles are stored by their
//! three-letter code, never by position in the role catalog.

pub const CREATE_NODES: &str = "
CREATE TABLE IF NOT EXISTS nodes (
    uuid        TEXT PRIMARY KEY,
    title       TEXT NOT NULL DEFAULT '',
    subtitle    TEXT NOT NULL DEFAULT '',
    manuscript  TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    summary     TEXT NOT NULL DEFAULT '',
    notes       TEXT NOT NULL DEFAULT ''
);
";

// Child ids are plain references: a child may be stored after its parent,
// so only the parent side carries a foreign key.
pub const CREATE_CHILDREN: &str = "
CREATE TABLE IF NOT EXISTS children (
    parent_uuid TEXT    NOT NULL REFERENCES nodes(uuid) ON DELETE CASCADE,
    child_uuid  TEXT    NOT NULL,
    seq         INTEGER NOT NULL,
    PRIMARY KEY (parent_uuid, seq)
);

CREATE INDEX IF NOT EXISTS children_child_idx ON children(child_uuid);
";

pub const CREATE_CONTRIBUTORS: &str = "
CREATE TABLE IF NOT EXISTS contributors (
    parent_uuid  TEXT    NOT NULL REFERENCES nodes(uuid) ON DELETE CASCADE,
    name         TEXT    NOT NULL,
    sort_by_name TEXT    NOT NULL,
    role         TEXT    NOT NULL,   -- ContributorRole::code()
    seq          INTEGER NOT NULL,
    PRIMARY KEY (parent_uuid, seq)
);
";

/// Executed in order by `SanskritDb::create_tables`.
pub const TABLES: [&str; 3] = [CREATE_NODES, CREATE_CHILDREN, CREATE_CONTRIBUTORS];
