//! Conversion between core types and the plain-text rows stored in SQLite.
//!
//! A [`RawNode`] is an owned snapshot of a [`Node`] that can be moved onto
//! the connection thread; it is also what a read produces before decoding.

use sanskrit_core::{Contributor, ContributorRole, Identifier, Node, NodeField, NodeFields};

use crate::Result;

/// Column holding a scalar field on the `nodes` table.
pub fn column(field: NodeField) -> Option<&'static str> {
  match field {
    NodeField::Title => Some("title"),
    NodeField::Subtitle => Some("subtitle"),
    NodeField::Manuscript => Some("manuscript"),
    NodeField::Description => Some("description"),
    NodeField::Summary => Some("summary"),
    NodeField::Notes => Some("notes"),
    NodeField::Children | NodeField::Contributors => None,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// One `contributors` row, minus the parent and sequence columns.
pub struct RawContributor {
  pub name:         String,
  pub sort_by_name: String,
  pub role:         String,
}

impl RawContributor {
  fn from_contributor(c: &Contributor) -> Self {
    Self {
      name:         c.name.clone(),
      sort_by_name: c.sort_by_name.clone(),
      role:         c.role.code().to_owned(),
    }
  }

  fn into_contributor(self) -> Result<Contributor> {
    let role = ContributorRole::from_code(&self.role)?;
    Ok(Contributor { name: self.name, sort_by_name: self.sort_by_name, role })
  }
}

/// A `nodes` row plus its child and contributor rows, in `seq` order.
pub struct RawNode {
  pub uuid:         String,
  pub fields:       NodeFields,
  pub children:     Vec<String>,
  pub contributors: Vec<RawContributor>,
}

impl RawNode {
  pub fn from_node(node: &Node) -> Self {
    Self {
      uuid:         node.uuid().to_string(),
      fields:       node.fields().clone(),
      children:     node.children().iter().map(ToString::to_string).collect(),
      contributors: node
        .contributors()
        .iter()
        .map(RawContributor::from_contributor)
        .collect(),
    }
  }

  /// Value of a scalar field; empty for the list fields.
  pub fn text(&self, field: NodeField) -> &str {
    match field {
      NodeField::Title => &self.fields.title,
      NodeField::Subtitle => &self.fields.subtitle,
      NodeField::Manuscript => &self.fields.manuscript,
      NodeField::Description => &self.fields.description,
      NodeField::Summary => &self.fields.summary,
      NodeField::Notes => &self.fields.notes,
      NodeField::Children | NodeField::Contributors => "",
    }
  }

  /// Hydrate a clean node: nothing dirty, nothing modified.
  pub fn into_node(self) -> Result<Node> {
    let contributors = self
      .contributors
      .into_iter()
      .map(RawContributor::into_contributor)
      .collect::<Result<Vec<_>>>()?;

    Ok(Node::from_parts(
      Identifier::from(self.uuid),
      self.fields,
      self.children.into_iter().map(Identifier::from).collect(),
      contributors,
    ))
  }
}
