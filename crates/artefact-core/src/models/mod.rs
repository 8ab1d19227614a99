//! Data models for the application
//!
//! Organized by domain: categories, organization documents, external drive files and the
//! tenant identity taken from bearer tokens.

mod category;
mod document;
mod drive;
mod identity;
mod organization;

pub use category::*;
pub use document::*;
pub use drive::*;
pub use identity::*;
pub use organization::*;
