//! Identifier: the primary key of every persisted entity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque, immutable string token.
///
/// Fresh identifiers wrap a random v4 UUID in its hyphenated lowercase form.
/// Well-known containers (e.g. `"manuscript"`) use explicit values instead.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
  /// Generate a new random identifier.
  pub fn new() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_string(self) -> String { self.0 }
}

impl Default for Identifier {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<String> for Identifier {
  fn from(value: String) -> Self { Self(value) }
}

impl From<&str> for Identifier {
  fn from(value: &str) -> Self { Self(value.to_owned()) }
}

impl AsRef<str> for Identifier {
  fn as_ref(&self) -> &str { &self.0 }
}
