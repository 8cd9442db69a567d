//! Node: the mutable, observable entity of the document tree.
//!
//! A node holds six text fields, an ordered list of child identifiers and an
//! ordered list of contributors. Every effective mutation:
//!
//! - updates the value,
//! - sets the coarse `modified` flag,
//! - records the field in the node's dirty [`ChangeSet`],
//! - notifies registered [`NodeListener`]s, most recently registered first,
//! - and returns the [`ChangeSet`] it produced.
//!
//! Setting a value equal to the current one is a no-op and returns an empty
//! change set. The dirty record is only cleared by the persistence layer.

use std::{fmt, sync::Arc};

use crate::{Contributor, Error, Identifier, Result};

// ─── Fields & change sets ────────────────────────────────────────────────────

/// One trackable attribute of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
  Title,
  Subtitle,
  Manuscript,
  Description,
  Summary,
  Notes,
  Children,
  Contributors,
}

impl NodeField {
  pub const ALL: [NodeField; 8] = [
    NodeField::Title,
    NodeField::Subtitle,
    NodeField::Manuscript,
    NodeField::Description,
    NodeField::Summary,
    NodeField::Notes,
    NodeField::Children,
    NodeField::Contributors,
  ];

  /// The six plain-text fields stored on the node row itself.
  pub const SCALARS: [NodeField; 6] = [
    NodeField::Title,
    NodeField::Subtitle,
    NodeField::Manuscript,
    NodeField::Description,
    NodeField::Summary,
    NodeField::Notes,
  ];

  pub fn is_scalar(self) -> bool {
    !matches!(self, NodeField::Children | NodeField::Contributors)
  }

  fn bit(self) -> u8 { 1 << self as u8 }
}

/// A set of [`NodeField`]s: either what one mutation changed, or everything
/// changed since the node was last persisted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChangeSet(u8);

impl ChangeSet {
  pub const EMPTY: ChangeSet = ChangeSet(0);
  pub const ALL: ChangeSet = ChangeSet(u8::MAX);

  pub fn only(field: NodeField) -> Self { Self(field.bit()) }

  pub fn is_empty(self) -> bool { self.0 == 0 }

  pub fn contains(self, field: NodeField) -> bool { self.0 & field.bit() != 0 }

  pub fn insert(&mut self, field: NodeField) { self.0 |= field.bit(); }

  pub fn union(self, other: ChangeSet) -> Self { Self(self.0 | other.0) }

  /// True if any of the six text fields is in the set.
  pub fn has_scalars(self) -> bool {
    NodeField::SCALARS.iter().any(|f| self.contains(*f))
  }

  pub fn iter(self) -> impl Iterator<Item = NodeField> {
    NodeField::ALL.into_iter().filter(move |f| self.contains(*f))
  }
}

impl FromIterator<NodeField> for ChangeSet {
  fn from_iter<I: IntoIterator<Item = NodeField>>(iter: I) -> Self {
    let mut set = ChangeSet::EMPTY;
    for field in iter {
      set.insert(field);
    }
    set
  }
}

impl fmt::Debug for ChangeSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

// ─── Listener ────────────────────────────────────────────────────────────────

/// Observer of field-level changes on a [`Node`].
///
/// Every callback defaults to a no-op so implementors only override what they
/// care about.
pub trait NodeListener: Send + Sync {
  fn title_changed(&self, _node: &Node) {}
  fn subtitle_changed(&self, _node: &Node) {}
  fn manuscript_changed(&self, _node: &Node) {}
  fn description_changed(&self, _node: &Node) {}
  fn summary_changed(&self, _node: &Node) {}
  fn notes_changed(&self, _node: &Node) {}
  fn children_changed(&self, _node: &Node) {}
  fn contributors_changed(&self, _node: &Node) {}
}

// ─── Node ────────────────────────────────────────────────────────────────────

/// The six text fields of a node, used to construct or hydrate one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFields {
  pub title:       String,
  pub subtitle:    String,
  pub manuscript:  String,
  pub description: String,
  pub summary:     String,
  pub notes:       String,
}

impl NodeFields {
  pub fn titled(title: impl Into<String>) -> Self {
    Self { title: title.into(), ..Self::default() }
  }
}

pub struct Node {
  uuid:         Identifier,
  fields:       NodeFields,
  children:     Vec<Identifier>,
  contributors: Vec<Contributor>,
  modified:     bool,
  dirty:        ChangeSet,
  listeners:    Vec<Arc<dyn NodeListener>>,
}

impl Node {
  /// A fresh node with a random identifier.
  pub fn new(fields: NodeFields) -> Self { Self::with_id(Identifier::new(), fields) }

  pub fn with_id(uuid: Identifier, fields: NodeFields) -> Self {
    Self::from_parts(uuid, fields, Vec::new(), Vec::new())
  }

  /// Assemble a node whose state already matches storage: nothing is dirty
  /// and nothing is modified.
  pub fn from_parts(
    uuid: Identifier,
    fields: NodeFields,
    children: Vec<Identifier>,
    contributors: Vec<Contributor>,
  ) -> Self {
    Self {
      uuid,
      fields,
      children,
      contributors,
      modified: false,
      dirty: ChangeSet::EMPTY,
      listeners: Vec::new(),
    }
  }

  pub fn uuid(&self) -> &Identifier { &self.uuid }

  pub fn fields(&self) -> &NodeFields { &self.fields }

  pub fn title(&self) -> &str { &self.fields.title }

  pub fn subtitle(&self) -> &str { &self.fields.subtitle }

  pub fn manuscript(&self) -> &str { &self.fields.manuscript }

  pub fn description(&self) -> &str { &self.fields.description }

  pub fn summary(&self) -> &str { &self.fields.summary }

  pub fn notes(&self) -> &str { &self.fields.notes }

  pub fn children(&self) -> &[Identifier] { &self.children }

  pub fn contributors(&self) -> &[Contributor] { &self.contributors }

  /// Text value of a scalar field; `None` for the two list fields.
  pub fn text(&self, field: NodeField) -> Option<&str> {
    let value = match field {
      NodeField::Title => &self.fields.title,
      NodeField::Subtitle => &self.fields.subtitle,
      NodeField::Manuscript => &self.fields.manuscript,
      NodeField::Description => &self.fields.description,
      NodeField::Summary => &self.fields.summary,
      NodeField::Notes => &self.fields.notes,
      NodeField::Children | NodeField::Contributors => return None,
    };
    Some(value)
  }

  // ── Modification state ────────────────────────────────────────────────

  /// True once any effective mutation has happened.
  pub fn is_modified(&self) -> bool { self.modified }

  pub fn clear_modified(&mut self) { self.modified = false; }

  /// Fields changed since the dirty record was last cleared.
  pub fn dirty(&self) -> ChangeSet { self.dirty }

  /// Called by the persistence layer once the dirty state has been written.
  pub fn clear_dirty(&mut self) { self.dirty = ChangeSet::EMPTY; }

  // ── Scalar setters ────────────────────────────────────────────────────

  pub fn set_title(&mut self, value: impl Into<String>) -> ChangeSet {
    self.set_text(NodeField::Title, value.into())
  }

  pub fn set_subtitle(&mut self, value: impl Into<String>) -> ChangeSet {
    self.set_text(NodeField::Subtitle, value.into())
  }

  pub fn set_manuscript(&mut self, value: impl Into<String>) -> ChangeSet {
    self.set_text(NodeField::Manuscript, value.into())
  }

  pub fn set_description(&mut self, value: impl Into<String>) -> ChangeSet {
    self.set_text(NodeField::Description, value.into())
  }

  pub fn set_summary(&mut self, value: impl Into<String>) -> ChangeSet {
    self.set_text(NodeField::Summary, value.into())
  }

  pub fn set_notes(&mut self, value: impl Into<String>) -> ChangeSet {
    self.set_text(NodeField::Notes, value.into())
  }

  /// Set any scalar field by name. List fields are ignored.
  pub fn set_text(&mut self, field: NodeField, value: String) -> ChangeSet {
    let slot = match field {
      NodeField::Title => &mut self.fields.title,
      NodeField::Subtitle => &mut self.fields.subtitle,
      NodeField::Manuscript => &mut self.fields.manuscript,
      NodeField::Description => &mut self.fields.description,
      NodeField::Summary => &mut self.fields.summary,
      NodeField::Notes => &mut self.fields.notes,
      NodeField::Children | NodeField::Contributors => return ChangeSet::EMPTY,
    };
    if *slot == value {
      return ChangeSet::EMPTY;
    }
    *slot = value;
    self.changed(field)
  }

  // ── Children ──────────────────────────────────────────────────────────

  /// Append `child` to the end of the child list.
  pub fn add_child(&mut self, child: Identifier) -> Result<ChangeSet> {
    self.check_not_self(&child)?;
    self.children.push(child);
    Ok(self.changed(NodeField::Children))
  }

  /// Place `child` at `index`, first removing any existing occurrence.
  ///
  /// `index` is checked against the list as it is after that removal, so
  /// this doubles as "move to position".
  pub fn insert_child(&mut self, index: usize, child: Identifier) -> Result<ChangeSet> {
    self.check_not_self(&child)?;
    let existing = self.children.iter().position(|c| *c == child);
    let len = self.children.len() - usize::from(existing.is_some());
    if index > len {
      return Err(Error::IndexOutOfBounds { index, len });
    }
    if existing == Some(index) {
      return Ok(ChangeSet::EMPTY);
    }
    if let Some(at) = existing {
      self.children.remove(at);
    }
    self.children.insert(index, child);
    Ok(self.changed(NodeField::Children))
  }

  /// Remove the first occurrence of `child`. No-op if it is not a child.
  pub fn remove_child(&mut self, child: &Identifier) -> ChangeSet {
    match self.children.iter().position(|c| c == child) {
      Some(at) => {
        self.children.remove(at);
        self.changed(NodeField::Children)
      }
      None => ChangeSet::EMPTY,
    }
  }

  /// Remove and return the child at `index`.
  pub fn remove_child_at(&mut self, index: usize) -> Result<(Identifier, ChangeSet)> {
    if index >= self.children.len() {
      return Err(Error::IndexOutOfBounds { index, len: self.children.len() });
    }
    let removed = self.children.remove(index);
    Ok((removed, self.changed(NodeField::Children)))
  }

  pub fn clear_children(&mut self) -> ChangeSet {
    if self.children.is_empty() {
      return ChangeSet::EMPTY;
    }
    self.children.clear();
    self.changed(NodeField::Children)
  }

  fn check_not_self(&self, child: &Identifier) -> Result<()> {
    if *child == self.uuid {
      return Err(Error::SelfReference(child.clone()));
    }
    Ok(())
  }

  // ── Contributors ──────────────────────────────────────────────────────

  pub fn add_contributor(&mut self, contributor: Contributor) -> ChangeSet {
    self.contributors.push(contributor);
    self.changed(NodeField::Contributors)
  }

  /// Remove the first contributor equal to `contributor`, if any.
  pub fn remove_contributor(&mut self, contributor: &Contributor) -> ChangeSet {
    match self.contributors.iter().position(|c| c == contributor) {
      Some(at) => {
        self.contributors.remove(at);
        self.changed(NodeField::Contributors)
      }
      None => ChangeSet::EMPTY,
    }
  }

  pub fn clear_contributors(&mut self) -> ChangeSet {
    if self.contributors.is_empty() {
      return ChangeSet::EMPTY;
    }
    self.contributors.clear();
    self.changed(NodeField::Contributors)
  }

  // ── Listeners ─────────────────────────────────────────────────────────

  pub fn add_listener(&mut self, listener: Arc<dyn NodeListener>) {
    self.listeners.push(listener);
  }

  /// Unregister `listener`. Returns false if it was not registered.
  pub fn remove_listener(&mut self, listener: &Arc<dyn NodeListener>) -> bool {
    match self.listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
      Some(at) => {
        self.listeners.remove(at);
        true
      }
      None => false,
    }
  }

  fn changed(&mut self, field: NodeField) -> ChangeSet {
    self.modified = true;
    self.dirty.insert(field);

    for listener in self.listeners.iter().rev() {
      match field {
        NodeField::Title => listener.title_changed(self),
        NodeField::Subtitle => listener.subtitle_changed(self),
        NodeField::Manuscript => listener.manuscript_changed(self),
        NodeField::Description => listener.description_changed(self),
        NodeField::Summary => listener.summary_changed(self),
        NodeField::Notes => listener.notes_changed(self),
        NodeField::Children => listener.children_changed(self),
        NodeField::Contributors => listener.contributors_changed(self),
      }
    }

    ChangeSet::only(field)
  }
}

impl PartialEq for Node {
  fn eq(&self, other: &Self) -> bool {
    self.uuid == other.uuid
      && self.fields == other.fields
      && self.children == other.children
      && self.contributors == other.contributors
  }
}

impl Eq for Node {}

impl fmt::Debug for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Node")
      .field("uuid", &self.uuid)
      .field("fields", &self.fields)
      .field("children", &self.children)
      .field("contributors", &self.contributors)
      .field("modified", &self.modified)
      .field("dirty", &self.dirty)
      .field("listeners", &self.listeners.len())
      .finish()
  }
}
