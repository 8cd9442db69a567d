//! Read-only projections of the document tree.
//!
//! A [`NodeReference`] is a snapshot of identifiers only. Anything that can
//! resolve an identifier to a [`Node`] (see [`NodeLookup`]) can be used to
//! build one and to render it as an indented outline.

use std::collections::HashMap;

use crate::{Identifier, Node};

/// Indentation emitted per depth level by [`NodeReference::render`].
const INDENT: &str = "  ";

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Resolves identifiers to nodes.
pub trait NodeLookup {
  fn get_node(&self, uuid: &Identifier) -> Option<&Node>;
}

/// An in-memory [`NodeLookup`] keyed by identifier.
#[derive(Debug, Default)]
pub struct NodeCache {
  nodes: HashMap<Identifier, Node>,
}

impl NodeCache {
  pub fn new() -> Self { Self::default() }

  /// Insert `node`, returning any node previously held under its identifier.
  pub fn insert(&mut self, node: Node) -> Option<Node> {
    self.nodes.insert(node.uuid().clone(), node)
  }

  pub fn get_mut(&mut self, uuid: &Identifier) -> Option<&mut Node> {
    self.nodes.get_mut(uuid)
  }

  pub fn remove(&mut self, uuid: &Identifier) -> Option<Node> { self.nodes.remove(uuid) }

  pub fn contains(&self, uuid: &Identifier) -> bool { self.nodes.contains_key(uuid) }

  pub fn len(&self) -> usize { self.nodes.len() }

  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
}

impl NodeLookup for NodeCache {
  fn get_node(&self, uuid: &Identifier) -> Option<&Node> { self.nodes.get(uuid) }
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// A recursively resolved subtree: an identifier and its resolvable children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReference {
  pub uuid:     Identifier,
  pub children: Vec<NodeReference>,
}

impl NodeReference {
  /// Snapshot the subtree under `root`.
  ///
  /// Child identifiers that `lookup` cannot resolve are skipped, as are
  /// identifiers that already appear on the path from `root` (cycles).
  pub fn from_node(root: &Node, lookup: &impl NodeLookup) -> Self {
    let mut path = vec![root.uuid().clone()];
    Self::build(root, lookup, &mut path)
  }

  fn build(node: &Node, lookup: &impl NodeLookup, path: &mut Vec<Identifier>) -> Self {
    let mut children = Vec::with_capacity(node.children().len());

    for child_id in node.children() {
      if path.contains(child_id) {
        continue;
      }
      let Some(child) = lookup.get_node(child_id) else { continue };

      path.push(child_id.clone());
      children.push(Self::build(child, lookup, path));
      path.pop();
    }

    Self { uuid: node.uuid().clone(), children }
  }

  /// Render as an outline: one title per line, depth-first, indented two
  /// spaces per level. Surrounding whitespace is trimmed.
  pub fn render(&self, lookup: &impl NodeLookup) -> String {
    let mut out = String::new();
    self.render_into(&mut out, 0, lookup);
    out.trim().to_owned()
  }

  fn render_into(&self, out: &mut String, depth: usize, lookup: &impl NodeLookup) {
    if let Some(node) = lookup.get_node(&self.uuid) {
      out.push_str(&INDENT.repeat(depth));
      out.push_str(node.title());
      out.push('\n');
    }
    for child in &self.children {
      child.render_into(out, depth + 1, lookup);
    }
  }

  /// Number of references in this subtree, including `self`.
  pub fn count(&self) -> usize { 1 + self.children.iter().map(Self::count).sum::<usize>() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::NodeFields;

  const EXPECTED: &str = "\
Manuscript
  Chapter 1
    Section A
      Subsection I
      Subsection II
      Subsection III
    Section B
      Subsection IV
      Subsection V
      Subsection VI
    Section C
      Subsection VII
      Subsection VIII
      Subsection IX
  Chapter 2
    Section D
      Subsection X
      Subsection XI
      Subsection XII
    Section E
      Subsection XIII
      Subsection XIV
      Subsection XV
    Section F
      Subsection XVI
      Subsection XVII
      Subsection XVIII
  Chapter 3
    Section G
      Subsection XIX
      Subsection XX
      Subsection XXI
    Section H
      Subsection XXII
      Subsection XXIII
      Subsection XXIV
    Section I
      Subsection XXV
      Subsection XXVI
      Subsection XXVII";

  const NUMERALS: [&str; 27] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
    "XIII", "XIV", "XV", "XVI", "XVII", "XVIII", "XIX", "XX", "XXI", "XXII",
    "XXIII", "XXIV", "XXV", "XXVI", "XXVII",
  ];

  /// Create a node titled after its identifier and hang it under `parent`.
  fn attach(cache: &mut NodeCache, parent: &Identifier, title: &str) -> Identifier {
    let node = Node::with_id(Identifier::from(title), NodeFields::titled(title));
    let id = node.uuid().clone();
    cache.insert(node);
    cache
      .get_mut(parent)
      .unwrap()
      .add_child(id.clone())
      .unwrap();
    id
  }

  fn fixture() -> (NodeCache, Identifier) {
    let mut cache = NodeCache::new();
    let root = Identifier::from("manuscript");
    cache.insert(Node::with_id(root.clone(), NodeFields::titled("Manuscript")));

    let mut section = b'A';
    let mut numeral = NUMERALS.iter();
    for chapter in 1..=3 {
      let ch = attach(&mut cache, &root, &format!("Chapter {chapter}"));
      for _ in 0..3 {
        let sec = attach(&mut cache, &ch, &format!("Section {}", section as char));
        section += 1;
        for _ in 0..3 {
          let n = numeral.next().unwrap();
          attach(&mut cache, &sec, &format!("Subsection {n}"));
        }
      }
    }

    (cache, root)
  }

  #[test]
  fn renders_fixture_outline() {
    let (cache, root) = fixture();
    let reference = NodeReference::from_node(cache.get_node(&root).unwrap(), &cache);

    assert_eq!(reference.count(), 1 + 3 + 9 + 27);
    assert_eq!(reference.render(&cache), EXPECTED);
  }

  #[test]
  fn dangling_children_are_skipped() {
    let mut cache = NodeCache::new();
    let mut root = Node::new(NodeFields::titled("Root"));
    let kept = Node::new(NodeFields::titled("Kept"));
    root.add_child(Identifier::new()).unwrap();
    root.add_child(kept.uuid().clone()).unwrap();
    let root_id = root.uuid().clone();
    cache.insert(kept);
    cache.insert(root);

    let reference = NodeReference::from_node(cache.get_node(&root_id).unwrap(), &cache);

    assert_eq!(reference.children.len(), 1);
    assert_eq!(reference.render(&cache), "Root\n  Kept");
  }

  #[test]
  fn cycles_are_cut() {
    let mut cache = NodeCache::new();
    let mut a = Node::new(NodeFields::titled("A"));
    let mut b = Node::new(NodeFields::titled("B"));
    a.add_child(b.uuid().clone()).unwrap();
    b.add_child(a.uuid().clone()).unwrap();
    let a_id = a.uuid().clone();
    cache.insert(a);
    cache.insert(b);

    let reference = NodeReference::from_node(cache.get_node(&a_id).unwrap(), &cache);

    assert_eq!(reference.count(), 2);
    assert_eq!(reference.render(&cache), "A\n  B");
  }

  #[test]
  fn unresolvable_titles_render_no_line() {
    let (mut cache, root) = fixture();
    let reference = NodeReference::from_node(cache.get_node(&root).unwrap(), &cache);
    cache.remove(&root);

    let rendered = reference.render(&cache);
    assert!(rendered.starts_with("Chapter 1\n    Section A"));
  }
}
