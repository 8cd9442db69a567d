//! Project: the four well-known root containers of a document.

use crate::{Identifier, Node, NodeFields};

/// A named document owning the manuscript, research, resources and trash
/// roots. Root identifiers are fixed, so one storage file holds one project.
#[derive(Debug)]
pub struct Project {
  pub name:       String,
  pub manuscript: Node,
  pub research:   Node,
  pub resources:  Node,
  pub trash:      Node,
}

impl Project {
  pub const MANUSCRIPT: &'static str = "manuscript";
  pub const RESEARCH: &'static str = "research";
  pub const RESOURCES: &'static str = "resources";
  pub const TRASH: &'static str = "trash";

  /// A project with four empty roots.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:       name.into(),
      manuscript: root(Self::MANUSCRIPT, "Manuscript"),
      research:   root(Self::RESEARCH, "Research"),
      resources:  root(Self::RESOURCES, "Resources"),
      trash:      root(Self::TRASH, "Trash"),
    }
  }

  pub fn roots(&self) -> [&Node; 4] {
    [&self.manuscript, &self.research, &self.resources, &self.trash]
  }

  /// True if `uuid` names one of the four roots.
  pub fn is_root(uuid: &Identifier) -> bool {
    matches!(
      uuid.as_str(),
      Self::MANUSCRIPT | Self::RESEARCH | Self::RESOURCES | Self::TRASH
    )
  }
}

fn root(uuid: &str, title: &str) -> Node {
  Node::with_id(Identifier::from(uuid), NodeFields::titled(title))
}
