//! Core document model for the Sanskrit outliner.
//!
//! This crate has no database dependencies. The SQLite
//! backend (`sanskrit-store-sqlite`) and the command-line front end both
//! build on the types defined here.

pub mod contributor;
pub mod error;
pub mod identifier;
pub mod node;
pub mod project;
pub mod reference;

pub use contributor::{Contributor, ContributorRole};
pub use error::{Error, Result};
pub use identifier::Identifier;
pub use node::{ChangeSet, Node, NodeField, NodeFields, NodeListener};
pub use project::Project;
pub use reference::{NodeCache, NodeLookup, NodeReference};
