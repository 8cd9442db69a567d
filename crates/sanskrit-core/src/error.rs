//! Error types for `sanskrit-core`.

use thiserror::Error;

use crate::Identifier;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown contributor role code: {0:?}")]
  UnknownRole(String),

  /// A node was asked to list itself as one of its own children.
  #[error("node {0} cannot be its own child")]
  SelfReference(Identifier),

  #[error("child index {index} out of bounds for {len} children")]
  IndexOutOfBounds { index: usize, len: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
