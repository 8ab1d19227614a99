//! Artefact Database Library
//!
//! Repository traits and their PostgreSQL implementations. Every query is scoped by
//! organization id; no method reads or writes rows of another organization.

pub mod db;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use db::*;
