//! Subcommands. Each returns the text to print on stdout.

use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::{Subcommand, ValueEnum};
use sanskrit_core::{
  Contributor, ContributorRole, Identifier, Node, NodeField, NodeFields, NodeListener,
  NodeLookup as _, NodeReference, Project,
};
use sanskrit_store_sqlite::SanskritDb;
use strum::IntoEnumIterator;
use tracing::{debug, info};

#[derive(Subcommand)]
pub enum Command {
  /// Create whichever of the four project roots are missing.
  Init {
    #[arg(long, default_value = "Untitled")]
    name: String,
  },
  /// Create a node and attach it under a parent. Prints the new id.
  Add {
    title:  String,
    #[arg(long, default_value = Project::MANUSCRIPT)]
    parent: String,
    /// Position among the parent's children; appended when omitted.
    #[arg(long)]
    index:  Option<usize>,
  },
  /// Print a node's fields, children and contributors.
  Show { id: String },
  /// Change one text field of a node.
  Set {
    id:    String,
    field: Field,
    value: String,
  },
  /// Detach a node from one parent and attach it to another (or reorder it
  /// within the same parent).
  Move {
    id:    String,
    #[arg(long)]
    from:  String,
    #[arg(long)]
    to:    String,
    #[arg(long)]
    index: Option<usize>,
  },
  /// Add or remove a contributor.
  Credit {
    id:      String,
    name:    String,
    /// Sorting form of the name; defaults to the name itself.
    #[arg(long)]
    sort_by: Option<String>,
    /// Three-letter role code.
    #[arg(long, default_value = "aut")]
    role:    String,
    #[arg(long)]
    remove:  bool,
  },
  /// Print the stored tree under a root as an indented outline.
  Outline {
    #[arg(default_value = Project::MANUSCRIPT)]
    root: String,
  },
  /// List contributor role codes.
  Roles,
}

/// The text fields `set` can change.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Field {
  Title,
  Subtitle,
  Manuscript,
  Description,
  Summary,
  Notes,
}

impl From<Field> for NodeField {
  fn from(field: Field) -> Self {
    match field {
      Field::Title => NodeField::Title,
      Field::Subtitle => NodeField::Subtitle,
      Field::Manuscript => NodeField::Manuscript,
      Field::Description => NodeField::Description,
      Field::Summary => NodeField::Summary,
      Field::Notes => NodeField::Notes,
    }
  }
}

pub async fn run(db: &SanskritDb, command: Command) -> Result<String> {
  match command {
    Command::Init { name } => init(db, name).await,
    Command::Add { title, parent, index } => add(db, title, &parent, index).await,
    Command::Show { id } => show(db, &id).await,
    Command::Set { id, field, value } => {
      let mut node = load(db, &id).await?;
      if node.set_text(field.into(), value).is_empty() {
        return Ok("unchanged".into());
      }
      db.patch_node(&mut node).await?;
      Ok(format!("updated {field:?}"))
    }
    Command::Move { id, from, to, index } => move_node(db, &id, &from, &to, index).await,
    Command::Credit { id, name, sort_by, role, remove } => {
      let role = ContributorRole::from_code(&role)?;
      let sort_by = sort_by.unwrap_or_else(|| name.clone());
      let contributor = Contributor::new(name, sort_by, role);

      let mut node = load(db, &id).await?;
      let changes = if remove {
        node.remove_contributor(&contributor)
      } else {
        node.add_contributor(contributor)
      };
      if changes.is_empty() {
        bail!("no such contributor on {id}");
      }
      db.patch_node(&mut node).await?;
      Ok(format!("{} contributors", node.contributors().len()))
    }
    Command::Outline { root } => {
      let root = Identifier::from(root);
      let cache = db.load_tree(&root).await?;
      let node = cache
        .get_node(&root)
        .with_context(|| format!("root {root} missing from loaded tree"))?;
      Ok(NodeReference::from_node(node, &cache).render(&cache))
    }
    Command::Roles => Ok(
      ContributorRole::iter()
        .map(|r| format!("{}  {}", r.code(), r.title()))
        .collect::<Vec<_>>()
        .join("\n"),
    ),
  }
}

async fn init(db: &SanskritDb, name: String) -> Result<String> {
  let project = Project::new(name);
  let mut created = Vec::new();

  for root in project.roots() {
    if !db.node_exists(root.uuid()).await? {
      db.store_node(root).await?;
      created.push(root.title());
    }
  }

  info!(project = %project.name, created = created.len(), "initialised project");
  Ok(if created.is_empty() {
    "all roots present".into()
  } else {
    format!("created {}", created.join(", "))
  })
}

async fn add(db: &SanskritDb, title: String, parent: &str, index: Option<usize>) -> Result<String> {
  let mut parent = load(db, parent).await?;
  let mut node = Node::new(NodeFields::titled(title));

  // Attach in memory first so a bad index stores nothing.
  match index {
    Some(index) => parent.insert_child(index, node.uuid().clone())?,
    None => parent.add_child(node.uuid().clone())?,
  };

  db.patch_nodes(&mut [&mut node, &mut parent]).await?;
  Ok(node.uuid().to_string())
}

async fn show(db: &SanskritDb, id: &str) -> Result<String> {
  let node = load(db, id).await?;
  let mut lines = vec![format!("uuid: {}", node.uuid())];

  for field in NodeField::SCALARS {
    if let Some(text) = node.text(field).filter(|t| !t.is_empty()) {
      lines.push(format!("{}: {text}", format!("{field:?}").to_lowercase()));
    }
  }
  for child in node.children() {
    lines.push(format!("child: {child}"));
  }
  for c in node.contributors() {
    lines.push(format!("contributor: {} ({})", c.name, c.role.title()));
  }

  Ok(lines.join("\n"))
}

async fn move_node(
  db: &SanskritDb,
  id: &str,
  from: &str,
  to: &str,
  index: Option<usize>,
) -> Result<String> {
  let child = Identifier::from(id);

  if from == to {
    let mut parent = load(db, from).await?;
    if !parent.children().contains(&child) {
      bail!("{child} is not a child of {from}");
    }
    let last = parent.children().len() - 1;
    parent.insert_child(index.unwrap_or(last), child)?;
    db.patch_node(&mut parent).await?;
    return Ok(format!("reordered under {from}"));
  }

  let subtree = db.load_tree(&child).await?;
  if subtree.contains(&Identifier::from(to)) {
    bail!("cannot move {child} under its own descendant {to}");
  }

  let mut source = load(db, from).await?;
  let mut target = load(db, to).await?;

  if source.remove_child(&child).is_empty() {
    bail!("{child} is not a child of {from}");
  }
  match index {
    Some(index) => target.insert_child(index, child)?,
    None => target.add_child(child)?,
  };

  db.patch_nodes(&mut [&mut source, &mut target]).await?;
  Ok(format!("moved to {to}"))
}

async fn load(db: &SanskritDb, id: &str) -> Result<Node> {
  let id = Identifier::from(id);
  let mut node = db
    .retrieve_node(&id)
    .await
    .with_context(|| format!("cannot load node {id}"))?;
  node.add_listener(Arc::new(ChangeLog));
  Ok(node)
}

// ─── Change log ──────────────────────────────────────────────────────────────

/// Logs every field change at debug level.
struct ChangeLog;

impl ChangeLog {
  fn log(node: &Node, field: NodeField) {
    debug!(uuid = %node.uuid(), ?field, "node changed");
  }
}

impl NodeListener for ChangeLog {
  fn title_changed(&self, node: &Node) { Self::log(node, NodeField::Title) }

  fn subtitle_changed(&self, node: &Node) { Self::log(node, NodeField::Subtitle) }

  fn manuscript_changed(&self, node: &Node) { Self::log(node, NodeField::Manuscript) }

  fn description_changed(&self, node: &Node) { Self::log(node, NodeField::Description) }

  fn summary_changed(&self, node: &Node) { Self::log(node, NodeField::Summary) }

  fn notes_changed(&self, node: &Node) { Self::log(node, NodeField::Notes) }

  fn children_changed(&self, node: &Node) { Self::log(node, NodeField::Children) }

  fn contributors_changed(&self, node: &Node) { Self::log(node, NodeField::Contributors) }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use tempfile::TempDir;

  use super::*;

  async fn store() -> (SanskritDb, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = SanskritDb::sqlite(1, dir.path().join("cli.db"), Duration::from_secs(5))
      .await
      .unwrap();
    run(&db, Command::Init { name: "Test".into() }).await.unwrap();
    (db, dir)
  }

  async fn add(db: &SanskritDb, title: &str, parent: &str) -> String {
    run(db, Command::Add { title: title.into(), parent: parent.into(), index: None })
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn init_is_idempotent() {
    let (db, _dir) = store().await;
    for root in ["manuscript", "research", "resources", "trash"] {
      assert!(db.node_exists(&Identifier::from(root)).await.unwrap());
    }
    let again = run(&db, Command::Init { name: "Test".into() }).await.unwrap();
    assert_eq!(again, "all roots present");
  }

  #[tokio::test]
  async fn add_and_outline() {
    let (db, _dir) = store().await;
    let ch1 = add(&db, "Chapter 1", "manuscript").await;
    add(&db, "Scene", &ch1).await;
    add(&db, "Chapter 2", "manuscript").await;

    let outline = run(&db, Command::Outline { root: "manuscript".into() }).await.unwrap();
    assert_eq!(outline, "Manuscript\n  Chapter 1\n    Scene\n  Chapter 2");
  }

  #[tokio::test]
  async fn bad_index_stores_nothing() {
    let (db, _dir) = store().await;
    let result = run(&db, Command::Add {
      title:  "Lost".into(),
      parent: "manuscript".into(),
      index:  Some(3),
    })
    .await;

    assert!(result.is_err());
    let root = db.retrieve_node(&Identifier::from("manuscript")).await.unwrap();
    assert!(root.children().is_empty());
  }

  #[tokio::test]
  async fn move_to_trash() {
    let (db, _dir) = store().await;
    let ch1 = add(&db, "Chapter 1", "manuscript").await;

    run(&db, Command::Move {
      id:    ch1.clone(),
      from:  "manuscript".into(),
      to:    "trash".into(),
      index: None,
    })
    .await
    .unwrap();

    let manuscript = db.retrieve_node(&Identifier::from("manuscript")).await.unwrap();
    let trash = db.retrieve_node(&Identifier::from("trash")).await.unwrap();
    assert!(manuscript.children().is_empty());
    assert_eq!(trash.children(), [Identifier::from(ch1)]);
  }

  #[tokio::test]
  async fn move_under_own_descendant_is_rejected() {
    let (db, _dir) = store().await;
    let chapter = add(&db, "Chapter", "manuscript").await;
    let section = add(&db, "Section", &chapter).await;

    let err = run(&db, Command::Move {
      id:    chapter.clone(),
      from:  "manuscript".into(),
      to:    section.clone(),
      index: None,
    })
    .await
    .unwrap_err();
    assert!(err.to_string().contains("descendant"));

    let outline = run(&db, Command::Outline { root: "manuscript".into() }).await.unwrap();
    assert_eq!(outline, "Manuscript\n  Chapter\n    Section");
    let section = db.retrieve_node(&Identifier::from(section)).await.unwrap();
    assert!(section.children().is_empty());
  }

  #[tokio::test]
  async fn move_onto_itself_is_rejected() {
    let (db, _dir) = store().await;
    let chapter = add(&db, "Chapter", "manuscript").await;

    let result = run(&db, Command::Move {
      id:    chapter.clone(),
      from:  "manuscript".into(),
      to:    chapter,
      index: None,
    })
    .await;
    assert!(result.is_err());

    let root = db.retrieve_node(&Identifier::from("manuscript")).await.unwrap();
    assert_eq!(root.children().len(), 1);
  }

  #[tokio::test]
  async fn reorder_within_parent() {
    let (db, _dir) = store().await;
    let a = add(&db, "A", "manuscript").await;
    let b = add(&db, "B", "manuscript").await;

    run(&db, Command::Move {
      id:    b.clone(),
      from:  "manuscript".into(),
      to:    "manuscript".into(),
      index: Some(0),
    })
    .await
    .unwrap();

    let root = db.retrieve_node(&Identifier::from("manuscript")).await.unwrap();
    assert_eq!(root.children(), [Identifier::from(b), Identifier::from(a)]);
  }

  #[tokio::test]
  async fn set_and_credit() {
    let (db, _dir) = store().await;
    let id = add(&db, "Draft", "manuscript").await;

    let out = run(&db, Command::Set {
      id:    id.clone(),
      field: Field::Summary,
      value: "It begins.".into(),
    })
    .await
    .unwrap();
    assert_eq!(out, "updated Summary");

    run(&db, Command::Credit {
      id:      id.clone(),
      name:    "Jane Austen".into(),
      sort_by: Some("Austen, Jane".into()),
      role:    "edt".into(),
      remove:  false,
    })
    .await
    .unwrap();

    let shown = run(&db, Command::Show { id }).await.unwrap();
    assert!(shown.contains("summary: It begins."));
    assert!(shown.contains("contributor: Jane Austen (Editor)"));
  }

  #[tokio::test]
  async fn unknown_role_is_rejected() {
    let (db, _dir) = store().await;
    let err = run(&db, Command::Credit {
      id:      "manuscript".into(),
      name:    "X".into(),
      sort_by: None,
      role:    "zzz".into(),
      remove:  false,
    })
    .await
    .unwrap_err();
    assert!(err.to_string().contains("zzz"));
  }
}
